use thiserror::Error;

use super::Dim;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Variable '{name}' has {num_values} dimension lengths but {num_dims} dimension names")]
    DimCountMismatch {
        name: String,
        num_values: usize,
        num_dims: usize,
    },

    #[error("Variable '{name}' has length {got} on dimension '{dim}', but the dataset has length {expected}")]
    DimLenMismatch {
        name: String,
        dim: Dim,
        got: usize,
        expected: usize,
    },

    #[error("The mask for variable '{0}' does not have the same shape as its values")]
    MaskShape(String),

    #[error("Dimension '{0}' does not exist in the dataset")]
    NoSuchDim(Dim),

    #[error("Index {index} is out of range for dimension '{dim}' of length {len}")]
    IndexOutOfRange { dim: Dim, index: usize, len: usize },

    #[error("Variable '{0}' holds complex values and has no single real representation")]
    ComplexToReal(String),
}
