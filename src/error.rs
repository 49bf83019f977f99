//! Error types for weighted PCA operations.

use std::error::Error;
use std::fmt;

/// Result type for weighted PCA operations.
pub type EmPcaResult<T> = Result<T, EmPcaError>;

/// Errors that can occur while fitting or applying a weighted PCA model.
///
/// All variants are deterministic functions of the inputs (and the seed);
/// nothing here is transient, so no operation is retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum EmPcaError {
    /// More components were requested than the feature space can hold.
    InvalidDimensions {
        n_components: usize,
        n_features: usize,
    },

    /// Arrays that must agree in shape do not.
    ShapeMismatch { context: String },

    /// A vector collapsed to numerical zero during orthonormalization,
    /// so no well-defined orthonormal direction exists for it.
    RankDeficient { row: usize },

    /// The weighted normal-equations system has no unique solution
    /// (for example, every weight in the sample is zero).
    SingularSystem,

    /// The model has not been fitted or loaded yet.
    NotFitted,

    /// Saving or loading a fitted model failed.
    Persistence(String),
}

impl fmt::Display for EmPcaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions {
                n_components,
                n_features,
            } => {
                write!(
                    f,
                    "n_components ({}) cannot exceed n_features ({})",
                    n_components, n_features
                )
            }
            Self::ShapeMismatch { context } => {
                write!(f, "shape mismatch: {}", context)
            }
            Self::RankDeficient { row } => {
                write!(
                    f,
                    "rank deficiency: row {} has no residual component left to normalize",
                    row
                )
            }
            Self::SingularSystem => {
                write!(f, "weighted normal-equations system is singular")
            }
            Self::NotFitted => {
                write!(f, "model is not fitted; call fit or load a model first")
            }
            Self::Persistence(message) => {
                write!(f, "model persistence failed: {}", message)
            }
        }
    }
}

impl Error for EmPcaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_dimensions() {
        let err = EmPcaError::InvalidDimensions {
            n_components: 7,
            n_features: 4,
        };
        assert_eq!(err.to_string(), "n_components (7) cannot exceed n_features (4)");
    }

    #[test]
    fn errors_are_boxable_as_std_error() {
        let err: Box<dyn Error> = Box::new(EmPcaError::NotFitted);
        assert!(err.to_string().contains("not fitted"));
    }
}
