//! Depth-truncated Hofbauer tower of a piecewise map.
//!
//! Starting from `[0, 1]`, every pass intersects the working domains with each
//! branch domain and pushes the branch image forward. Each distinct domain is
//! processed once; its images become the next pass's working set. The result
//! is the list of completed domains (discovery order) and, per branch, a 0/1
//! incidence matrix `adj[(target, source)]`.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::domain::arena::TowerArena;
use crate::domain::branch::Branch;
use crate::domain::error::{finite, DomainError, DomainResult};
use crate::domain::interval::{Interval, Precision};

/// Incidence of one branch: entry `(i, j)` is 1 iff the branch maps domain `j`
/// onto domain `i`.
pub type AdjacencyMatrix = DMatrix<u8>;

/// Order in which the working set of a pass is drained.
///
/// The order changes discovery positions but never which domains are found
/// in a pass nor which edges exist between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    /// Most recently produced domain first
    #[default]
    Lifo,
    /// Oldest produced domain first
    Fifo,
}

impl TraversalOrder {
    fn pop(&self, work: &mut VecDeque<Interval>) -> Option<Interval> {
        match self {
            TraversalOrder::Lifo => work.pop_back(),
            TraversalOrder::Fifo => work.pop_front(),
        }
    }
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalOrder::Lifo => write!(f, "lifo"),
            TraversalOrder::Fifo => write!(f, "fifo"),
        }
    }
}

/// The completed tower. Immutable once built.
#[derive(Debug, Clone)]
pub struct Tower {
    domains: Vec<Interval>,
    adjacency: Vec<AdjacencyMatrix>,
    passes: Vec<usize>,
}

impl Tower {
    /// Completed domains in discovery order; index 0 is `[0, 1]`.
    pub fn domains(&self) -> &[Interval] {
        &self.domains
    }

    pub fn adjacency(&self, branch: usize) -> Option<&AdjacencyMatrix> {
        self.adjacency.get(branch)
    }

    pub fn adjacencies(&self) -> &[AdjacencyMatrix] {
        &self.adjacency
    }

    /// Pass (0-based) in which each domain was completed.
    pub fn passes(&self) -> &[usize] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn branch_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn has_edge(&self, branch: usize, target: usize, source: usize) -> bool {
        self.adjacency
            .get(branch)
            .filter(|adj| target < adj.nrows() && source < adj.ncols())
            .is_some_and(|adj| adj[(target, source)] == 1)
    }

    /// `(target, source)` pairs incident under `branch`, row-major.
    pub fn edges(&self, branch: usize) -> Vec<(usize, usize)> {
        let Some(adj) = self.adjacency.get(branch) else {
            return Vec::new();
        };
        let n = adj.nrows();
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|&(i, j)| adj[(i, j)] == 1)
            .collect()
    }

    pub fn into_parts(self) -> (Vec<Interval>, Vec<AdjacencyMatrix>) {
        (self.domains, self.adjacency)
    }
}

/// Builder for [`Tower`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainTower {
    precision: Precision,
    traversal: TraversalOrder,
}

impl DomainTower {
    pub fn new(precision: Precision, traversal: TraversalOrder) -> Self {
        Self {
            precision,
            traversal,
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn traversal(&self) -> TraversalOrder {
        self.traversal
    }

    /// Build the tower of a set of branches.
    pub fn build(&self, branches: &[Branch], depth: usize) -> DomainResult<Tower> {
        let domains: Vec<Interval> = branches.iter().map(|b| b.domain).collect();
        let functions: Vec<_> = branches.iter().map(|b| move |x: f64| b.eval(x)).collect();
        self.build_with(&domains, &functions, depth)
    }

    /// Build the tower from branch domains and their (fallible) functions.
    #[instrument(level = "debug", skip(self, function_domains, functions), fields(branches = function_domains.len()))]
    pub fn build_with<F>(
        &self,
        function_domains: &[Interval],
        functions: &[F],
        depth: usize,
    ) -> DomainResult<Tower>
    where
        F: Fn(f64) -> DomainResult<f64>,
    {
        if depth == 0 {
            return Err(DomainError::invalid("depth", "must be at least 1"));
        }
        if function_domains.len() != functions.len() {
            return Err(DomainError::ShapeMismatch(format!(
                "{} branch domains but {} functions",
                function_domains.len(),
                functions.len()
            )));
        }

        let mut complete = TowerArena::new();
        let mut working: VecDeque<Interval> = VecDeque::from([Interval::unit()]);

        for pass in 0..depth {
            let mut produced = VecDeque::new();

            while let Some(current) = self.traversal.pop(&mut working) {
                if complete.contains(&current) {
                    continue;
                }
                let mut images = Vec::with_capacity(functions.len());
                for (branch_domain, f) in function_domains.iter().zip(functions) {
                    let image = match current.intersect(branch_domain) {
                        Some(cut) => self.image_of(f, cut)?,
                        None => None,
                    };
                    if let Some(img) = image {
                        if !complete.contains(&img) {
                            produced.push_back(img);
                        }
                    }
                    images.push(image);
                }
                trace!(%current, pass, "domain completed");
                complete.insert(current, images, pass);
            }

            debug!(pass, domains = complete.len(), next = produced.len(), "tower pass done");
            if produced.is_empty() {
                debug!(pass, "tower stopped growing");
                break;
            }
            working = produced;
        }

        Ok(self.finish(&complete, functions.len()))
    }

    fn image_of<F>(&self, f: &F, cut: Interval) -> DomainResult<Option<Interval>>
    where
        F: Fn(f64) -> DomainResult<f64>,
    {
        let lo = finite(f(cut.start())?, "branch function", cut.start())?;
        let hi = finite(f(cut.end())?, "branch function", cut.end())?;
        let image = Interval::spanned(lo, hi, self.precision);
        if image.is_none() {
            warn!(%cut, "branch collapses domain to a point; treated as no edge");
        }
        Ok(image)
    }

    fn finish(&self, complete: &TowerArena, branches: usize) -> Tower {
        let n = complete.len();
        let mut adjacency = vec![AdjacencyMatrix::zeros(n, n); branches];
        for (source, node) in complete.iter() {
            for (branch, image) in node.images.iter().enumerate() {
                if let Some(target) = image.as_ref().and_then(|img| complete.position(img)) {
                    adjacency[branch][(target, source)] = 1;
                }
            }
        }
        Tower {
            domains: complete.iter().map(|(_, node)| node.domain).collect(),
            adjacency,
            passes: complete.iter().map(|(_, node)| node.pass).collect(),
        }
    }
}
