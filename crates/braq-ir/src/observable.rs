//! Measurement observables and their basis rotations.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::matrix::Matrix;
use crate::parameter::FreeParameterExpression;

const HERMITIAN_EQ_TOLERANCE: f64 = 1e-8;

/// A Hermitian matrix together with its diagonalizing rotation.
///
/// The eigen-decomposition is computed once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HermitianMatrix {
    matrix: Matrix,
    eigenvalues: Vec<f64>,
    /// `V†`, where the columns of `V` are eigenvectors.
    diagonalizing: Matrix,
}

impl HermitianMatrix {
    /// Validate and diagonalize `matrix`.
    pub fn new(matrix: Matrix) -> IrResult<Self> {
        let (eigenvalues, vectors) = matrix.eigh()?;
        Ok(Self {
            matrix,
            eigenvalues,
            diagonalizing: vectors.adjoint(),
        })
    }

    /// The matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Eigenvalues in ascending order.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Unitary rotating the eigenbasis onto the computational basis.
    pub fn diagonalizing_unitary(&self) -> &Matrix {
        &self.diagonalizing
    }
}

impl PartialEq for HermitianMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.matrix.approx_eq(&other.matrix, HERMITIAN_EQ_TOLERANCE)
    }
}

/// An observable to measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observable {
    /// Identity.
    Identity,
    /// Pauli X.
    PauliX,
    /// Pauli Y.
    PauliY,
    /// Pauli Z.
    PauliZ,
    /// Hadamard.
    Hadamard,
    /// An arbitrary Hermitian matrix.
    Hermitian(HermitianMatrix),
    /// Tensor product of at least two factors, none of which is itself a
    /// tensor product.
    TensorProduct(Vec<Observable>),
}

impl Observable {
    /// Hermitian observable from a matrix.
    pub fn hermitian(matrix: Matrix) -> IrResult<Self> {
        Ok(Observable::Hermitian(HermitianMatrix::new(matrix)?))
    }

    /// Tensor product of `factors`, flattening nested products.
    pub fn tensor_product(factors: Vec<Observable>) -> IrResult<Self> {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Observable::TensorProduct(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() < 2 {
            return Err(IrError::TensorProductTooSmall(flat.len()));
        }
        Ok(Observable::TensorProduct(flat))
    }

    /// Number of qubits the observable acts on.
    pub fn qubit_count(&self) -> usize {
        match self {
            Observable::Hermitian(h) => h.matrix.qubit_count(),
            Observable::TensorProduct(factors) => factors.iter().map(Observable::qubit_count).sum(),
            _ => 1,
        }
    }

    /// Whether this is the identity.
    pub fn is_identity(&self) -> bool {
        matches!(self, Observable::Identity)
    }

    /// Tensor factors; a single-element slice for anything else.
    pub fn factors(&self) -> &[Observable] {
        match self {
            Observable::TensorProduct(factors) => factors,
            other => std::slice::from_ref(other),
        }
    }

    /// Gates rotating the measurement basis onto the computational basis.
    pub fn basis_rotation_gates(&self) -> Vec<Gate> {
        match self {
            Observable::Identity | Observable::PauliZ => vec![],
            Observable::PauliX => vec![Gate::H],
            Observable::PauliY => vec![Gate::Z, Gate::S, Gate::H],
            Observable::Hadamard => vec![Gate::Ry(FreeParameterExpression::number(-FRAC_PI_4))],
            Observable::Hermitian(h) => vec![Gate::Unitary(h.diagonalizing.clone())],
            Observable::TensorProduct(factors) => {
                factors.iter().flat_map(Observable::basis_rotation_gates).collect()
            }
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Identity => f.write_str("I"),
            Observable::PauliX => f.write_str("X"),
            Observable::PauliY => f.write_str("Y"),
            Observable::PauliZ => f.write_str("Z"),
            Observable::Hadamard => f.write_str("H"),
            Observable::Hermitian(_) => f.write_str("Hermitian"),
            Observable::TensorProduct(factors) => {
                let names: Vec<String> = factors.iter().map(ToString::to_string).collect();
                f.write_str(&names.join("@"))
            }
        }
    }
}
