//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services are concrete structs, not traits.

mod maps;
mod transfer;

pub use maps::{MapKind, MapSpec};
pub use transfer::{
    BlockCache, CacheStats, Comparison, SuperOperator, TransferOperatorService,
};
