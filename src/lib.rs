//! Transfer operators of piecewise-expanding interval maps.
//!
//! The Hofbauer tower of a map is discovered by iterating its branches on
//! `[0, 1]`; each tower edge carries a Chebyshev collocation block of the
//! branch's transfer operator, and the blocks form one super-adjacency
//! matrix. An Ulam bin-counting matrix is available as a baseline.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
