//! Ulam's method: a bin-counting baseline for the transfer operator.
//!
//! `[0, 1]` is cut into `N` equal bins; `M` sample points per bin are pushed
//! through the map and counted by the bin they land in. Row `i` of the result
//! is the empirical distribution of images of bin `i`.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::domain::error::{finite, DomainError, DomainResult};

/// How sample points are placed inside each bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// `M` evenly spaced points including both bin edges
    #[default]
    Grid,
    /// `M` uniform random points from a seeded generator
    Uniform { seed: u64 },
}

/// Index of the bin holding `x`: `edges[i] <= x < edges[i + 1]`, clipped to
/// `0..bins`.
fn digitize(x: f64, edges: &[f64]) -> usize {
    let bins = edges.len() - 1;
    let above = edges.partition_point(|&e| e <= x);
    above.saturating_sub(1).min(bins - 1)
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Row-stochastic `N x N` Ulam matrix of `f` on `[0, 1]`.
#[instrument(level = "debug", skip(f))]
pub fn ulams_method<F>(bins: usize, samples: usize, f: F, sampling: Sampling) -> DomainResult<DMatrix<f64>>
where
    F: Fn(f64) -> DomainResult<f64>,
{
    if bins == 0 {
        return Err(DomainError::invalid("bins", "must be at least 1"));
    }
    if samples == 0 {
        return Err(DomainError::invalid("samples", "must be at least 1"));
    }

    let edges = linspace(0.0, 1.0, bins + 1);
    let mut rng = match sampling {
        Sampling::Uniform { seed } => Some(StdRng::seed_from_u64(seed)),
        Sampling::Grid => None,
    };

    let mut counts = DMatrix::<f64>::zeros(bins, bins);
    for i in 0..bins {
        let (lo, hi) = (edges[i], edges[i + 1]);
        let points = match rng.as_mut() {
            Some(rng) => (0..samples).map(|_| rng.gen_range(lo..hi)).collect(),
            None => linspace(lo, hi, samples),
        };
        for x in points {
            let j = digitize(finite(f(x)?, "ulam map", x)?, &edges);
            counts[(i, j)] += 1.0;
        }
    }

    for mut row in counts.row_iter_mut() {
        let total = row.sum();
        row /= total;
    }
    debug!(bins, samples, "ulam matrix built");
    Ok(counts)
}
