// Weighted principal component analysis via expectation-maximization

#![doc = include_str!("../README.md")]

pub mod empca;
pub mod error;
pub mod linalg;

pub use empca::{empca, EmPca, EmPcaConfig};
pub use error::{EmPcaError, EmPcaResult};
pub use linalg::{orthonormalize, random_orthonormal, reorthonormalize_prefix, solve_weighted};
