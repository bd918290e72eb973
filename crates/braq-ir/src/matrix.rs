//! Dense complex matrices and Hermitian diagonalization.
//!
//! Diagonalization is delegated to `faer`; [`Matrix`] keeps the row-major
//! storage used for hashing and serialization.

use faer::{Mat, Side, c64};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::{IrError, IrResult};

const HERMITIAN_TOLERANCE: f64 = 1e-8;

/// A square complex matrix stored row-major.
///
/// Equality and hashing are bitwise so matrices can sit inside gate keys;
/// use [`Matrix::approx_eq`] for numerical comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl Matrix {
    /// Build from rows; the matrix must be square with a power-of-two dimension.
    pub fn new(rows: Vec<Vec<Complex64>>) -> IrResult<Self> {
        let dim = rows.len();
        if dim < 2 || !dim.is_power_of_two() {
            return Err(IrError::InvalidMatrix(format!(
                "dimension {dim} is not a power of two greater than 1"
            )));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != dim) {
            return Err(IrError::InvalidMatrix(format!(
                "row of length {} in a {dim}x{dim} matrix",
                row.len()
            )));
        }
        Ok(Self {
            dim,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Build from real-valued rows.
    pub fn from_real(rows: Vec<Vec<f64>>) -> IrResult<Self> {
        Self::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| Complex64::new(v, 0.0)).collect())
                .collect(),
        )
    }

    /// The identity of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// Number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits the matrix acts on.
    pub fn qubit_count(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: Complex64) {
        self.data[row * self.dim + col] = value;
    }

    /// Rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Complex64]> {
        self.data.chunks(self.dim)
    }

    /// Conjugate transpose.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        let mut out = self.clone();
        for r in 0..self.dim {
            for c in 0..self.dim {
                out.set(r, c, self.get(c, r).conj());
            }
        }
        out
    }

    /// Matrix product `self * rhs`.
    #[must_use]
    pub fn matmul(&self, rhs: &Matrix) -> Self {
        let n = self.dim;
        let mut out = Matrix {
            dim: n,
            data: vec![Complex64::new(0.0, 0.0); n * n],
        };
        for r in 0..n {
            for c in 0..n {
                let mut acc = Complex64::new(0.0, 0.0);
                for k in 0..n {
                    acc += self.get(r, k) * rhs.get(k, c);
                }
                out.set(r, c, acc);
            }
        }
        out
    }

    /// Element-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.dim == other.dim
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).norm() <= tolerance)
    }

    /// Whether the matrix equals its conjugate transpose.
    pub fn is_hermitian(&self) -> bool {
        self.approx_eq(&self.adjoint(), HERMITIAN_TOLERANCE)
    }

    /// Whether `U U† = I`.
    pub fn is_unitary(&self) -> bool {
        self.matmul(&self.adjoint())
            .approx_eq(&Matrix::identity(self.dim), HERMITIAN_TOLERANCE)
    }

    /// Eigen-decomposition of a Hermitian matrix.
    ///
    /// Returns eigenvalues in ascending order and the unitary whose columns
    /// are the matching eigenvectors.
    pub fn eigh(&self) -> IrResult<(Vec<f64>, Matrix)> {
        if !self.is_hermitian() {
            return Err(IrError::NonHermitian);
        }
        let n = self.dim;
        let dense = Mat::<c64>::from_fn(n, n, |r, c| {
            let value = self.get(r, c);
            c64::new(value.re, value.im)
        });
        let eigen = dense
            .self_adjoint_eigen(Side::Lower)
            .map_err(|err| IrError::InvalidMatrix(format!("eigendecomposition failed: {err:?}")))?;
        let values = eigen.S().column_vector();
        let vectors = eigen.U();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| values[i].re.total_cmp(&values[j].re));

        let eigenvalues = order.iter().map(|&i| values[i].re).collect();
        let mut out = Matrix::identity(n);
        for (new_col, &old_col) in order.iter().enumerate() {
            for r in 0..n {
                let value = vectors[(r, old_col)];
                out.set(r, new_col, Complex64::new(value.re, value.im));
            }
        }
        Ok((eigenvalues, out))
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim
            && self.data.iter().zip(&other.data).all(|(a, b)| {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            })
    }
}

impl Eq for Matrix {}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dim.hash(state);
        for value in &self.data {
            value.re.to_bits().hash(state);
            value.im.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn assert_diagonalizes(m: &Matrix) {
        let (values, vectors) = m.eigh().unwrap();
        assert!(vectors.is_unitary());
        let diag = vectors.adjoint().matmul(m).matmul(&vectors);
        for r in 0..m.dim() {
            for col in 0..m.dim() {
                let expected = if r == col { c(values[r], 0.0) } else { c(0.0, 0.0) };
                assert!(
                    (diag.get(r, col) - expected).norm() < 1e-9,
                    "entry ({r}, {col}) = {}",
                    diag.get(r, col)
                );
            }
        }
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(Matrix::from_real(vec![vec![1.0, 0.0, 0.0]; 3]).is_err());
        assert!(Matrix::from_real(vec![vec![1.0, 0.0], vec![0.0]]).is_err());
    }

    #[test]
    fn test_eigh_pauli_x() {
        let x = Matrix::from_real(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let (values, _) = x.eigh().unwrap();
        assert!((values[0] + 1.0).abs() < 1e-12);
        assert!((values[1] - 1.0).abs() < 1e-12);
        assert_diagonalizes(&x);
    }

    #[test]
    fn test_eigh_pauli_y() {
        let y = Matrix::new(vec![vec![c(0.0, 0.0), c(0.0, -1.0)], vec![c(0.0, 1.0), c(0.0, 0.0)]])
            .unwrap();
        assert_diagonalizes(&y);
    }

    #[test]
    fn test_eigh_two_qubit() {
        let m = Matrix::new(vec![
            vec![c(1.0, 0.0), c(0.5, 0.5), c(0.0, 0.0), c(0.2, 0.0)],
            vec![c(0.5, -0.5), c(-1.0, 0.0), c(0.0, 0.3), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, -0.3), c(2.0, 0.0), c(0.1, 0.1)],
            vec![c(0.2, 0.0), c(0.0, 0.0), c(0.1, -0.1), c(0.5, 0.0)],
        ])
        .unwrap();
        assert_eq!(m.qubit_count(), 2);
        assert_diagonalizes(&m);
    }

    #[test]
    fn test_eigh_degenerate_spectrum() {
        let zz = Matrix::from_real(vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, -1.0, 0.0, 0.0],
            vec![0.0, 0.0, -1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        let (values, _) = zz.eigh().unwrap();
        assert_eq!(values.len(), 4);
        assert!((values[0] + 1.0).abs() < 1e-12 && (values[1] + 1.0).abs() < 1e-12);
        assert!((values[2] - 1.0).abs() < 1e-12 && (values[3] - 1.0).abs() < 1e-12);
        assert_diagonalizes(&zz);
    }

    #[test]
    fn test_eigh_rejects_non_hermitian() {
        let m = Matrix::from_real(vec![vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        assert!(matches!(m.eigh(), Err(IrError::NonHermitian)));
    }
}
