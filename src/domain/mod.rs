//! Domain layer: intervals, branches, towers and operator discretisation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod assembly;
pub mod branch;
pub mod chebyshev;
pub mod error;
pub mod interval;
pub mod maps;
pub mod operator;
pub mod tower;
pub mod ulam;

pub use arena::{TowerArena, TowerNode};
pub use assembly::{BlockSource, DirectBlocks, SuperAdjacencyAssembler};
pub use branch::{Branch, PiecewiseMap, ScalarFn};
pub use chebyshev::approximate;
pub use error::{DomainError, DomainResult};
pub use interval::{Interval, Precision};
pub use maps::{skew_tent_map, tent_map};
pub use operator::{IdentityOperator, OperatorKey, TransferOperator, WeightedComposition};
pub use tower::{AdjacencyMatrix, DomainTower, Tower, TraversalOrder};
pub use ulam::{ulams_method, Sampling};
