//! Block assembly of the tower operator.
//!
//! Each branch contributes a block matrix whose `(i, j)` block is the
//! Chebyshev block of that branch from domain `j` to domain `i` when the
//! tower has that edge, and zero otherwise. The operator of the whole map is
//! the element-wise sum of the branch contributions.

use itertools::iproduct;
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::chebyshev;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::interval::Interval;
use crate::domain::operator::TransferOperator;
use crate::domain::tower::{AdjacencyMatrix, Tower};

/// Supplies the block of one incident `(target, source)` pair.
///
/// [`DirectBlocks`] goes straight to [`chebyshev::approximate`]; the
/// application layer plugs in a caching source.
pub trait BlockSource: Sync {
    fn block(
        &self,
        operator: &dyn TransferOperator,
        source: Interval,
        target: Interval,
        order: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>>;
}

/// Computes every block afresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectBlocks;

impl BlockSource for DirectBlocks {
    fn block(
        &self,
        operator: &dyn TransferOperator,
        source: Interval,
        target: Interval,
        order: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>> {
        chebyshev::approximate(operator, order, order, source, target, passes)
    }
}

/// Assembler for the super-adjacency matrix.
pub struct SuperAdjacencyAssembler<'a> {
    blocks: &'a dyn BlockSource,
    parallel: bool,
}

impl Default for SuperAdjacencyAssembler<'static> {
    fn default() -> Self {
        Self {
            blocks: &DirectBlocks,
            parallel: true,
        }
    }
}

impl<'a> SuperAdjacencyAssembler<'a> {
    pub fn new(blocks: &'a dyn BlockSource, parallel: bool) -> Self {
        Self { blocks, parallel }
    }

    /// Block matrix of one branch, gated by its adjacency matrix.
    pub fn assemble(
        &self,
        adj: &AdjacencyMatrix,
        domains: &[Interval],
        operator: &dyn TransferOperator,
        k: usize,
        n: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>> {
        self.assemble_branch(0, adj, domains, operator, k, n, passes)
    }

    /// Sum of the per-branch block matrices over all branches of the tower.
    #[instrument(level = "debug", skip(self, tower, operators), fields(domains = tower.len()))]
    pub fn assemble_all(
        &self,
        tower: &Tower,
        operators: &[&dyn TransferOperator],
        k: usize,
        n: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>> {
        if operators.len() != tower.branch_count() {
            return Err(DomainError::ShapeMismatch(format!(
                "{} adjacency matrices but {} operators",
                tower.branch_count(),
                operators.len()
            )));
        }
        let size = tower.len();
        let mut total = DMatrix::<f64>::zeros(size * k, size * n);
        for (branch, (adj, op)) in tower.adjacencies().iter().zip(operators).enumerate() {
            total += self.assemble_branch(branch, adj, tower.domains(), *op, k, n, passes)?;
        }
        Ok(total)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_branch(
        &self,
        branch: usize,
        adj: &AdjacencyMatrix,
        domains: &[Interval],
        operator: &dyn TransferOperator,
        k: usize,
        n: usize,
        passes: usize,
    ) -> DomainResult<DMatrix<f64>> {
        if k != n {
            return Err(DomainError::OrderMismatch { k, n });
        }
        let size = domains.len();
        if adj.nrows() != size || adj.ncols() != size {
            return Err(DomainError::ShapeMismatch(format!(
                "adjacency is {}x{} for {} domains",
                adj.nrows(),
                adj.ncols(),
                size
            )));
        }

        let pairs: Vec<(usize, usize)> = iproduct!(0..size, 0..size)
            .filter(|&(i, j)| adj[(i, j)] == 1)
            .collect();
        debug!(branch, incident = pairs.len(), "assembling branch");

        let compute = |&(i, j): &(usize, usize)| {
            self.blocks
                .block(operator, domains[j], domains[i], k, passes)
                .map(|block| (i, j, block))
        };
        let blocks: Vec<(usize, usize, DMatrix<f64>)> = if self.parallel {
            pairs.par_iter().map(compute).collect::<DomainResult<_>>()?
        } else {
            pairs.iter().map(compute).collect::<DomainResult<_>>()?
        };

        let mut out = DMatrix::<f64>::zeros(size * k, size * n);
        for (i, j, block) in blocks {
            out.view_mut((i * k, j * n), (k, n)).copy_from(&block);
        }
        Ok(out)
    }
}
