//! Dense primitives underneath the EM iteration: seeded random orthonormal
//! initialization, ordered Gram-Schmidt orthonormalization, and the
//! per-sample weighted least-squares solve.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use ndarray_linalg::Solve;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::{EmPcaError, EmPcaResult};

/// Residual norms below this threshold are treated as a rank deficiency
/// during orthonormalization.
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Draws `n_vectors` mutually orthonormal rows of length `n_features`.
///
/// The rows are sampled from a standard normal distribution and then
/// orthonormalized, so the result is reproducible for a fixed `seed`. The
/// generator is a local `ChaCha8Rng` instance; no global random state is
/// touched, and concurrent callers with their own seeds are independent.
///
/// # Errors
///
/// Fails with [`EmPcaError::InvalidDimensions`] if `n_vectors > n_features`
/// (no orthonormal set of that size exists), or with
/// [`EmPcaError::RankDeficient`] in the measure-zero event that the random
/// draw itself is rank deficient.
pub fn random_orthonormal(
    n_vectors: usize,
    n_features: usize,
    seed: Option<u64>,
) -> EmPcaResult<Array2<f64>> {
    if n_vectors > n_features {
        return Err(EmPcaError::InvalidDimensions {
            n_components: n_vectors,
            n_features,
        });
    }
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let draw = Array2::<f64>::random_using((n_vectors, n_features), StandardNormal, &mut rng);
    orthonormalize(draw)
}

/// Orthonormalizes the rows of `vectors` in order (modified Gram-Schmidt).
///
/// Row `i` of the output is row `i` of the input minus its projections onto
/// the already-processed rows `0..i`, normalized to unit length. Processing
/// in order preserves the nested subspace chain: for every prefix length
/// `i`, the span of the first `i` output rows equals the span of the first
/// `i` input rows.
///
/// # Errors
///
/// Fails with [`EmPcaError::RankDeficient`] if a row's residual norm falls
/// below [`RANK_TOLERANCE`] after the earlier components are removed. No
/// arbitrary orthogonal complement is substituted.
pub fn orthonormalize(mut vectors: Array2<f64>) -> EmPcaResult<Array2<f64>> {
    let n_rows = vectors.nrows();
    reorthonormalize_prefix(&mut vectors, n_rows)?;
    Ok(vectors)
}

/// Restores orthonormality of rows `0..prefix_len` of `basis`, in place.
///
/// This is the invariant-restoring operation the M-step applies after every
/// single row update; rows at `prefix_len` and beyond are left untouched.
/// Same ordering and degenerate-case policy as [`orthonormalize`].
pub fn reorthonormalize_prefix(basis: &mut Array2<f64>, prefix_len: usize) -> EmPcaResult<()> {
    debug_assert!(prefix_len <= basis.nrows());
    for i in 0..prefix_len {
        for j in 0..i {
            let earlier = basis.row(j).to_owned();
            let projection = basis.row(i).dot(&earlier);
            basis.row_mut(i).scaled_add(-projection, &earlier);
        }
        let norm = basis.row(i).dot(&basis.row(i)).sqrt();
        if norm < RANK_TOLERANCE {
            return Err(EmPcaError::RankDeficient { row: i });
        }
        basis.row_mut(i).mapv_inplace(|v| v / norm);
    }
    Ok(())
}

/// Solves the per-sample weighted least-squares problem.
///
/// `basis` (k × d) is used as the design matrix; its rows are not required
/// to be orthonormal here. Given one observation `x` (length d) and one
/// non-negative weight vector `w` (length d), returns the coefficient
/// vector `c` minimizing `Σ_j w_j² (x_j − Σ_i c_i B_ij)²` by solving the
/// k × k normal equations `(B diag(w²) Bᵀ) c = B diag(w²) x` with an LU
/// factorization.
///
/// Entries with `w_j == 0` are excluded exactly: whatever value occupies
/// `x_j` there (including `NaN` or infinities) cannot reach the solution.
///
/// # Errors
///
/// [`EmPcaError::ShapeMismatch`] if `x` or `w` disagree with `basis` on the
/// feature count; [`EmPcaError::SingularSystem`] if every weight is zero or
/// the normal-equations matrix cannot be factorized.
pub fn solve_weighted(
    basis: ArrayView2<f64>,
    x: ArrayView1<f64>,
    w: ArrayView1<f64>,
) -> EmPcaResult<Array1<f64>> {
    let (_, n_features) = basis.dim();
    if x.len() != n_features || w.len() != n_features {
        return Err(EmPcaError::ShapeMismatch {
            context: format!(
                "solve_weighted expects x and w of length {}, got {} and {}",
                n_features,
                x.len(),
                w.len()
            ),
        });
    }
    if w.iter().all(|&wj| wj == 0.0) {
        return Err(EmPcaError::SingularSystem);
    }

    let w2 = w.mapv(|wj| wj * wj);
    // Zero-weight entries of x are masked out rather than multiplied, so a
    // NaN placeholder at weight zero stays inert.
    let x_masked = Zip::from(&x)
        .and(&w)
        .map_collect(|&xj, &wj| if wj == 0.0 { 0.0 } else { xj });

    let weighted_basis = &basis * &w2;
    let gram = weighted_basis.dot(&basis.t());
    let rhs = weighted_basis.dot(&x_masked);

    gram.solve_into(rhs).map_err(|_| EmPcaError::SingularSystem)
}
