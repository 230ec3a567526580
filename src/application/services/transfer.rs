//! Transfer operator service
//!
//! Builds the Hofbauer tower of a piecewise-expanding map, discretises the
//! transfer operator of every branch into Chebyshev blocks and assembles the
//! super-adjacency matrix. Also runs the Ulam baseline on the same map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nalgebra::DMatrix;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationResult, DomainResultExt};
use crate::config::Settings;
use crate::domain::{
    chebyshev, ulams_method, BlockSource, Branch, DirectBlocks, DomainResult, DomainTower,
    Interval, OperatorKey, PiecewiseMap, SuperAdjacencyAssembler, Tower, TransferOperator,
    WeightedComposition,
};

/// Tower and assembled matrix of one approximation run.
#[derive(Debug, Clone)]
pub struct SuperOperator {
    pub tower: Tower,
    pub matrix: DMatrix<f64>,
    /// Chebyshev order per block
    pub order: usize,
    /// Refinement passes used for every block
    pub passes: usize,
}

impl SuperOperator {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.matrix.norm()
    }
}

/// Summary of the spectral and Ulam discretisations of one map.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub super_shape: (usize, usize),
    pub super_norm: f64,
    pub domains: usize,
    pub ulam_shape: (usize, usize),
    pub ulam_row_sum_min: f64,
    pub ulam_row_sum_max: f64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

type BlockKey = (OperatorKey, Interval, Interval, usize, usize);

/// Block source remembering every block it computed.
///
/// Operators without a key are computed every time. Entries are never
/// evicted: each key holds the inverse and derivative of its branch alive
/// until [`BlockCache::clear`], so a long-lived service should clear between
/// unrelated maps.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: Mutex<HashMap<BlockKey, DMatrix<f64>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.blocks.lock().unwrap_or_else(|e| e.into_inner()).len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }

    pub fn clear(&self) {
        self.blocks.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl BlockSource for BlockCache {
    fn block(
        &self,
        operator: &dyn TransferOperator,
        source: Interval,
        target: Interval,
        order: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>> {
        let Some(op_key) = operator.key() else {
            return chebyshev::approximate(operator, order, order, source, target, passes);
        };
        let key = (op_key, source, target, order, passes);

        if let Some(hit) = self
            .blocks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit.clone());
        }

        // lock released while computing
        let block = chebyshev::approximate(operator, order, order, source, target, passes)?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.blocks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, block.clone());
        Ok(block)
    }
}

/// Service for transfer operator approximation.
pub struct TransferOperatorService {
    settings: Arc<Settings>,
    cache: BlockCache,
}

impl TransferOperatorService {
    /// Create a new transfer operator service.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            cache: BlockCache::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn tower_builder(&self) -> DomainTower {
        DomainTower::new(
            self.settings.tower.precision(),
            self.settings.tower.traversal,
        )
    }

    fn block_source(&self) -> &dyn BlockSource {
        if self.settings.approximation.cache_blocks {
            &self.cache
        } else {
            &DirectBlocks
        }
    }

    /// Build the Hofbauer tower of `branches` down to `depth` passes.
    #[instrument(level = "debug", skip(self, branches), fields(branches = branches.len()))]
    pub fn build_tower(&self, branches: &[Branch], depth: usize) -> ApplicationResult<Tower> {
        let tower = self
            .tower_builder()
            .build(branches, depth)
            .with_step_context("build tower", format!("depth {depth}"))?;
        debug!(domains = tower.len(), "tower built");
        Ok(tower)
    }

    /// One weighted-composition operator per branch, in branch order.
    pub fn construct_transfer_operators(&self, branches: &[Branch]) -> Vec<WeightedComposition> {
        branches
            .iter()
            .cloned()
            .map(WeightedComposition::new)
            .collect()
    }

    /// Assemble the super-adjacency matrix of `tower`.
    ///
    /// `operators[b]` is gated by the adjacency matrix of branch `b`.
    pub fn create_super_adjacency(
        &self,
        tower: &Tower,
        operators: &[WeightedComposition],
        n: usize,
        k: usize,
        passes: usize,
    ) -> ApplicationResult<DMatrix<f64>> {
        let ops: Vec<&dyn TransferOperator> = operators
            .iter()
            .map(|op| op as &dyn TransferOperator)
            .collect();
        let assembler =
            SuperAdjacencyAssembler::new(self.block_source(), self.settings.approximation.parallel);
        let matrix = assembler
            .assemble_all(tower, &ops, k, n, passes)
            .with_step_context("assemble super adjacency", format!("{} domains", tower.len()))?;
        Ok(matrix)
    }

    /// Tower plus super-adjacency matrix of `branches`.
    ///
    /// `depth` bounds the tower; every block uses the configured
    /// `refinement_passes`.
    #[instrument(level = "debug", skip(self, branches), fields(branches = branches.len()))]
    pub fn approx_super_adjacency(
        &self,
        branches: &[Branch],
        n: usize,
        k: usize,
        depth: usize,
    ) -> ApplicationResult<SuperOperator> {
        let tower = self.build_tower(branches, depth)?;
        let operators = self.construct_transfer_operators(branches);
        let passes = self.settings.approximation.refinement_passes;
        let matrix = self.create_super_adjacency(&tower, &operators, n, k, passes)?;
        info!(
            domains = tower.len(),
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            "super adjacency assembled"
        );
        Ok(SuperOperator {
            tower,
            matrix,
            order: k,
            passes,
        })
    }

    /// Ulam matrix of the whole map with the configured bins and sampling.
    #[instrument(level = "debug", skip(self, map))]
    pub fn approx_ulams(&self, map: &PiecewiseMap) -> ApplicationResult<DMatrix<f64>> {
        let ulam = &self.settings.ulam;
        let matrix = ulams_method(ulam.bins, ulam.samples, |x| map.eval(x), ulam.sampling())
            .with_step_context("ulam matrix", format!("{} bins", ulam.bins))?;
        Ok(matrix)
    }

    /// Both discretisations of `branches` with the configured parameters.
    pub fn compare(&self, branches: Vec<Branch>) -> ApplicationResult<Comparison> {
        let order = self.settings.approximation.order;
        let depth = self.settings.tower.depth;
        let spectral = self.approx_super_adjacency(&branches, order, order, depth)?;
        let map = PiecewiseMap::new(branches);
        let ulam = self.approx_ulams(&map)?;

        let row_sums: Vec<f64> = ulam.row_iter().map(|r| r.sum()).collect();
        let ulam_row_sum_min = row_sums.iter().copied().fold(f64::INFINITY, f64::min);
        let ulam_row_sum_max = row_sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Comparison {
            super_shape: spectral.shape(),
            super_norm: spectral.frobenius_norm(),
            domains: spectral.tower.len(),
            ulam_shape: ulam.shape(),
            ulam_row_sum_min,
            ulam_row_sum_max,
        })
    }
}
