//! Plain-text matrix files: one row per line, entries separated by spaces.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::DMatrix;
use tracing::debug;

use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Writes matrices through a [`FileSystem`].
pub struct MatrixStore {
    fs: Arc<dyn FileSystem>,
    output_dir: PathBuf,
}

impl MatrixStore {
    /// Relative paths are resolved against `output_dir`.
    pub fn new(fs: Arc<dyn FileSystem>, output_dir: PathBuf) -> Self {
        Self { fs, output_dir }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }

    /// Write `matrix` and return the path actually written.
    pub fn write(&self, path: &Path, matrix: &DMatrix<f64>) -> InfraResult<PathBuf> {
        let target = self.resolve(path);
        self.fs
            .ensure_parent(&target)
            .map_err(|e| InfraError::io(format!("create parent of {}", target.display()), e))?;
        self.fs
            .write(&target, &format_matrix(matrix))
            .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
        debug!(path = %target.display(), rows = matrix.nrows(), cols = matrix.ncols(), "matrix written");
        Ok(target)
    }
}

pub fn format_matrix(matrix: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for row in matrix.row_iter() {
        let line = row
            .iter()
            .map(|v| format!("{v:.18e}"))
            .collect::<Vec<_>>()
            .join(" ");
        // writing to a String cannot fail
        let _ = writeln!(out, "{line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_matrix_when_formatted_then_one_line_per_row() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, -0.5, 2.0, 1e-20, 3.0]);
        let text = format_matrix(&m);
        let rows: Vec<Vec<f64>> = text
            .lines()
            .map(|l| l.split_whitespace().map(|t| t.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows, vec![vec![1.0, 0.0, -0.5], vec![2.0, 1e-20, 3.0]]);
    }

    #[test]
    fn given_entry_when_formatted_then_scientific_with_18_digits() {
        let text = format_matrix(&DMatrix::from_element(1, 1, 0.25));
        assert_eq!(text, "2.500000000000000000e-1\n");
    }
}
