//! Expectation-maximization PCA over per-entry reliability weights.
//!
//! The iteration alternates two phases over mean-centered data. The E-step
//! re-estimates every sample's coefficients under the current basis, each
//! sample independently (and in parallel). The M-step re-estimates the basis
//! one row at a time: the contribution of the already-updated rows is
//! deflated from the data, the row is refit as the weighted least-squares
//! direction of the residual against its coefficient column, and the row
//! prefix is immediately re-orthonormalized so the next row's deflation sees
//! an orthonormal basis. A fixed number of E/M cycles is run, with no
//! convergence test, followed by one final E-step so the returned
//! coefficients are consistent with the returned basis.

use log::{info, trace, warn};
use ndarray::{s, Array1, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EmPcaError, EmPcaResult};
use crate::linalg::{random_orthonormal, reorthonormalize_prefix, solve_weighted};

/// E-step: per-sample coefficients under the current basis.
///
/// Returns the coefficient matrix and the number of samples whose weighted
/// system was singular; those samples get zero coefficients. Without
/// weights this is a plain projection onto the basis rows.
fn e_step(
    data: &Array2<f64>,
    weights: Option<&Array2<f64>>,
    basis: &Array2<f64>,
) -> (Array2<f64>, usize) {
    match weights {
        None => (data.dot(&basis.t()), 0),
        Some(w) => {
            let mut coeff = Array2::<f64>::zeros((data.nrows(), basis.nrows()));
            let degenerate = AtomicUsize::new(0);
            Zip::from(coeff.rows_mut())
                .and(data.rows())
                .and(w.rows())
                .par_for_each(|mut coeff_row, data_row, weight_row| {
                    match solve_weighted(basis.view(), data_row, weight_row) {
                        Ok(solution) => coeff_row.assign(&solution),
                        Err(_) => {
                            coeff_row.fill(0.0);
                            degenerate.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            (coeff, degenerate.into_inner())
        }
    }
}

/// M-step: refit each basis row against the deflated weighted residual.
///
/// Rows are processed strictly in order and the prefix is re-orthonormalized
/// after every single row update; later rows' deflation depends on the
/// earlier rows already being orthonormal.
fn m_step(
    data: &Array2<f64>,
    weights: Option<&Array2<f64>>,
    basis: &mut Array2<f64>,
    coeff: &Array2<f64>,
) -> EmPcaResult<()> {
    let (n_samples, n_features) = data.dim();
    for i in 0..basis.nrows() {
        let reconstruction = coeff.slice(s![.., ..i]).dot(&basis.slice(s![..i, ..]));
        let residual = data - &reconstruction;
        let coeff_column = coeff.column(i);

        let mut numerator = Array1::<f64>::zeros(n_features);
        let mut denominator = Array1::<f64>::zeros(n_features);
        match weights {
            Some(w) => {
                for sample in 0..n_samples {
                    let c = coeff_column[sample];
                    Zip::from(&mut numerator)
                        .and(&mut denominator)
                        .and(residual.row(sample))
                        .and(w.row(sample))
                        .for_each(|num, den, &r, &wj| {
                            // Zero-weight entries are skipped outright so a
                            // NaN placeholder in the data stays inert.
                            if wj != 0.0 {
                                let w2 = wj * wj;
                                *num += c * w2 * r;
                                *den += c * c * w2;
                            }
                        });
                }
            }
            None => {
                numerator = residual.t().dot(&coeff_column);
                denominator.fill(coeff_column.dot(&coeff_column));
            }
        }

        // A feature with zero accumulated weighted coefficient mass carries
        // no information about this direction; it gets a zero entry and the
        // prefix re-orthonormalization below decides whether the row as a
        // whole is still usable.
        let mut row = basis.row_mut(i);
        Zip::from(&mut row)
            .and(&numerator)
            .and(&denominator)
            .for_each(|b, &num, &den| {
                *b = if den > 0.0 { num / den } else { 0.0 };
            });

        reorthonormalize_prefix(basis, i + 1)?;
    }
    Ok(())
}

/// Runs the EM-PCA iteration over mean-centered data.
///
/// * `data` - Centered data, shape (n_samples, n_features). Centering is the
///   caller's responsibility; [`EmPca`] does it for you.
/// * `weights` - Optional non-negative per-entry weights, same shape as
///   `data`. A zero weight excludes the entry entirely, so its stored value
///   may be anything, including non-finite placeholders. `None` means
///   uniform unit weights and enables the projection fast path.
/// * `n_components` - Number of basis vectors to fit (≤ n_features).
/// * `n_iter` - Fixed E/M cycle budget; no convergence test is applied.
/// * `seed` - Seed for the random orthonormal initialization.
///
/// Returns `(basis, coeff)`: the orthonormal basis rows
/// (n_components × n_features) and the per-sample coefficients
/// (n_samples × n_components) from a final E-step against that basis.
///
/// Samples whose weighted system is singular (for example an all-zero weight
/// row) receive zero coefficients; the count is reported once per fit via
/// `log::warn!` rather than aborting the fit.
///
/// # Errors
///
/// [`EmPcaError::InvalidDimensions`] if `n_components > n_features`,
/// [`EmPcaError::ShapeMismatch`] if the weight shape disagrees with the
/// data, [`EmPcaError::RankDeficient`] if a basis row collapses during
/// re-orthonormalization (the requested component count exceeds what the
/// data can support).
pub fn empca(
    data: &Array2<f64>,
    weights: Option<&Array2<f64>>,
    n_components: usize,
    n_iter: usize,
    seed: Option<u64>,
) -> EmPcaResult<(Array2<f64>, Array2<f64>)> {
    let (n_samples, n_features) = data.dim();
    if n_components > n_features {
        return Err(EmPcaError::InvalidDimensions {
            n_components,
            n_features,
        });
    }
    if let Some(w) = weights {
        if w.dim() != data.dim() {
            return Err(EmPcaError::ShapeMismatch {
                context: format!(
                    "weight matrix is {:?} but data matrix is {:?}",
                    w.dim(),
                    data.dim()
                ),
            });
        }
    }

    info!(
        "Starting EM-PCA: {} samples x {} features, {} components, {} iterations, weighted={}",
        n_samples,
        n_features,
        n_components,
        n_iter,
        weights.is_some()
    );

    let mut basis = random_orthonormal(n_components, n_features, seed)?;
    for iteration in 0..n_iter {
        let (coeff, _) = e_step(data, weights, &basis);
        m_step(data, weights, &mut basis, &coeff)?;
        trace!("EM-PCA iteration {}/{} complete", iteration + 1, n_iter);
    }
    let (coeff, degenerate_samples) = e_step(data, weights, &basis);
    if degenerate_samples > 0 {
        warn!(
            "{} of {} samples had singular weighted systems; their coefficients are zero",
            degenerate_samples, n_samples
        );
    }
    info!("EM-PCA finished after {} iterations", n_iter);

    Ok((basis, coeff))
}

/// Configuration for an [`EmPca`] fit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmPcaConfig {
    /// Number of components to fit. `None` resolves to
    /// `min(n_samples, n_features)` at fit time.
    pub n_components: Option<usize>,
    /// Fixed number of E/M cycles per fit.
    pub max_iter: usize,
    /// Seed for the random orthonormal initialization. `None` seeds from
    /// entropy, making each fit independent.
    pub random_seed: Option<u64>,
}

impl Default for EmPcaConfig {
    fn default() -> Self {
        EmPcaConfig {
            n_components: None,
            max_iter: 100,
            random_seed: None,
        }
    }
}

/// Weighted PCA estimator built on the EM iteration.
///
/// Owns the (weighted) mean of the training data, seeds and runs the engine,
/// and publishes the fitted basis and variance statistics as read-only
/// state. The components, mean, and explained variance together are the
/// complete state needed to reproduce `transform` and `inverse_transform`,
/// and that is exactly what [`EmPca::save_model`] persists.
#[derive(Serialize, Deserialize, Debug)]
pub struct EmPca {
    config: EmPcaConfig,
    /// Orthonormal basis rows. Shape: (k_components, n_features)
    components: Option<Array2<f64>>,
    /// Weighted mean of the training data. Shape: (n_features)
    mean: Option<Array1<f64>>,
    /// Per-component coefficient variance. Shape: (k_components)
    explained_variance: Option<Array1<f64>>,
    /// `explained_variance` divided by the total variance of the centered
    /// training data. Shape: (k_components)
    explained_variance_ratio: Option<Array1<f64>>,
}

impl Default for EmPca {
    fn default() -> Self {
        Self::new()
    }
}

impl EmPca {
    /// Creates an unfitted estimator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmPcaConfig::default())
    }

    /// Creates an unfitted estimator with the given configuration.
    pub fn with_config(config: EmPcaConfig) -> Self {
        Self {
            config,
            components: None,
            mean: None,
            explained_variance: None,
            explained_variance_ratio: None,
        }
    }

    /// Returns the fitted orthonormal components (rows), if fitted.
    pub fn components(&self) -> Option<&Array2<f64>> {
        self.components.as_ref()
    }

    /// Returns the weighted mean of the training data, if fitted.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    /// Returns the per-component explained variance, if fitted.
    pub fn explained_variance(&self) -> Option<&Array1<f64>> {
        self.explained_variance.as_ref()
    }

    /// Returns the per-component explained variance ratio, if fitted.
    pub fn explained_variance_ratio(&self) -> Option<&Array1<f64>> {
        self.explained_variance_ratio.as_ref()
    }

    /// Fits the model to `x` and returns the per-sample coefficients.
    ///
    /// * `x` - Data, shape (n_samples, n_features), at least two samples.
    /// * `weights` - Optional non-negative per-entry weights, same shape as
    ///   `x`. Zero-weight entries are ignored entirely, so missing values
    ///   can be encoded with weight zero and an arbitrary placeholder.
    ///
    /// The data is centered on its weighted mean (`Σ w·x / Σ w` per feature,
    /// plain mean without weights); a feature with zero total weight gets
    /// mean 0. Fitting replaces any previously published state.
    ///
    /// # Errors
    ///
    /// [`EmPcaError::ShapeMismatch`] for weight/data disagreement or fewer
    /// than two samples, plus any engine error from [`empca`].
    pub fn fit_transform(
        &mut self,
        x: &Array2<f64>,
        weights: Option<&Array2<f64>>,
    ) -> EmPcaResult<Array2<f64>> {
        let (n_samples, n_features) = x.dim();
        if n_samples < 2 {
            return Err(EmPcaError::ShapeMismatch {
                context: format!("fit requires at least 2 samples, got {}", n_samples),
            });
        }
        if let Some(w) = weights {
            if w.dim() != x.dim() {
                return Err(EmPcaError::ShapeMismatch {
                    context: format!(
                        "weight matrix is {:?} but data matrix is {:?}",
                        w.dim(),
                        x.dim()
                    ),
                });
            }
        }

        let mean = match weights {
            None => x.mean_axis(Axis(0)).ok_or_else(|| EmPcaError::ShapeMismatch {
                context: "data matrix has no samples".into(),
            })?,
            Some(w) => weighted_column_mean(x, w),
        };
        let centered = x - &mean;

        let n_components = self
            .config
            .n_components
            .unwrap_or_else(|| n_samples.min(n_features));
        let (basis, coeff) = empca(
            &centered,
            weights,
            n_components,
            self.config.max_iter,
            self.config.random_seed,
        )?;

        let explained_variance =
            coeff.map_axis(Axis(0), |column| column.dot(&column) / n_samples as f64);
        let total_variance = masked_total_variance(&centered, weights);
        let explained_variance_ratio = if total_variance > 0.0 {
            &explained_variance / total_variance
        } else {
            Array1::zeros(explained_variance.len())
        };

        self.components = Some(basis);
        self.mean = Some(mean);
        self.explained_variance = Some(explained_variance);
        self.explained_variance_ratio = Some(explained_variance_ratio);
        Ok(coeff)
    }

    /// Fits the model to `x`. See [`EmPca::fit_transform`].
    pub fn fit(&mut self, x: &Array2<f64>, weights: Option<&Array2<f64>>) -> EmPcaResult<()> {
        self.fit_transform(x, weights).map(|_| ())
    }

    /// Projects `x` onto the fitted components: one E-step against the
    /// frozen basis. Samples whose weighted system is singular get zero
    /// coefficients, reported via `log::warn!`.
    ///
    /// # Errors
    ///
    /// [`EmPcaError::NotFitted`] before a fit,
    /// [`EmPcaError::ShapeMismatch`] if `x` (or `weights`) disagree with the
    /// model's feature count.
    pub fn transform(
        &self,
        x: &Array2<f64>,
        weights: Option<&Array2<f64>>,
    ) -> EmPcaResult<Array2<f64>> {
        let components = self.components.as_ref().ok_or(EmPcaError::NotFitted)?;
        let mean = self.mean.as_ref().ok_or(EmPcaError::NotFitted)?;
        if x.ncols() != mean.len() {
            return Err(EmPcaError::ShapeMismatch {
                context: format!(
                    "input has {} features but the model was fitted with {}",
                    x.ncols(),
                    mean.len()
                ),
            });
        }
        if let Some(w) = weights {
            if w.dim() != x.dim() {
                return Err(EmPcaError::ShapeMismatch {
                    context: format!(
                        "weight matrix is {:?} but data matrix is {:?}",
                        w.dim(),
                        x.dim()
                    ),
                });
            }
        }

        let centered = x - mean;
        let (coeff, degenerate_samples) = e_step(&centered, weights, components);
        if degenerate_samples > 0 {
            warn!(
                "{} of {} samples had singular weighted systems; their coefficients are zero",
                degenerate_samples,
                x.nrows()
            );
        }
        Ok(coeff)
    }

    /// Maps coefficients back to the original space:
    /// `coeff · components + mean`.
    ///
    /// # Errors
    ///
    /// [`EmPcaError::NotFitted`] before a fit,
    /// [`EmPcaError::ShapeMismatch`] if the coefficient count disagrees with
    /// the fitted components.
    pub fn inverse_transform(&self, coeff: &Array2<f64>) -> EmPcaResult<Array2<f64>> {
        let components = self.components.as_ref().ok_or(EmPcaError::NotFitted)?;
        let mean = self.mean.as_ref().ok_or(EmPcaError::NotFitted)?;
        if coeff.ncols() != components.nrows() {
            return Err(EmPcaError::ShapeMismatch {
                context: format!(
                    "coefficients have {} columns but the model has {} components",
                    coeff.ncols(),
                    components.nrows()
                ),
            });
        }
        Ok(coeff.dot(components) + mean)
    }

    /// Reconstructs `x` through the fitted model: `transform` followed by
    /// `inverse_transform`.
    pub fn reconstruct(
        &self,
        x: &Array2<f64>,
        weights: Option<&Array2<f64>>,
    ) -> EmPcaResult<Array2<f64>> {
        let coeff = self.transform(x, weights)?;
        self.inverse_transform(&coeff)
    }

    /// Fits the model and reconstructs `x` in one call.
    pub fn fit_reconstruct(
        &mut self,
        x: &Array2<f64>,
        weights: Option<&Array2<f64>>,
    ) -> EmPcaResult<Array2<f64>> {
        let coeff = self.fit_transform(x, weights)?;
        self.inverse_transform(&coeff)
    }

    /// Saves the fitted model to a file using bincode.
    ///
    /// # Errors
    ///
    /// [`EmPcaError::NotFitted`] if the model has no components yet;
    /// [`EmPcaError::Persistence`] on I/O or serialization failure.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> EmPcaResult<()> {
        if self.components.is_none() || self.mean.is_none() {
            return Err(EmPcaError::NotFitted);
        }
        let file = File::create(path.as_ref()).map_err(|e| {
            EmPcaError::Persistence(format!("failed to create {:?}: {}", path.as_ref(), e))
        })?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| EmPcaError::Persistence(format!("failed to serialize model: {}", e)))?;
        Ok(())
    }

    /// Loads a model previously saved with [`EmPca::save_model`], validating
    /// that the stored arrays are present, dimensionally consistent, and
    /// finite where they must be.
    ///
    /// # Errors
    ///
    /// [`EmPcaError::Persistence`] on I/O, deserialization, or validation
    /// failure.
    pub fn load_model<P: AsRef<Path>>(path: P) -> EmPcaResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            EmPcaError::Persistence(format!("failed to open {:?}: {}", path.as_ref(), e))
        })?;
        let mut reader = BufReader::new(file);
        let model: EmPca =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    EmPcaError::Persistence(format!("failed to deserialize model: {}", e))
                })?;

        let components = model
            .components
            .as_ref()
            .ok_or_else(|| EmPcaError::Persistence("loaded model has no components".into()))?;
        let mean = model
            .mean
            .as_ref()
            .ok_or_else(|| EmPcaError::Persistence("loaded model has no mean vector".into()))?;
        if components.ncols() != mean.len() {
            return Err(EmPcaError::Persistence(format!(
                "components have {} features but the mean vector has {}",
                components.ncols(),
                mean.len()
            )));
        }
        for variances in [&model.explained_variance, &model.explained_variance_ratio] {
            if let Some(values) = variances {
                if values.len() != components.nrows() {
                    return Err(EmPcaError::Persistence(format!(
                        "variance vector has length {} but the model has {} components",
                        values.len(),
                        components.nrows()
                    )));
                }
                if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(EmPcaError::Persistence(
                        "variance vector contains non-finite or negative values".into(),
                    ));
                }
            }
        }
        Ok(model)
    }
}

/// Per-feature weighted mean, skipping zero-weight entries outright so
/// placeholder values there (including NaN) never contribute. A feature with
/// zero total weight gets mean 0.
fn weighted_column_mean(x: &Array2<f64>, weights: &Array2<f64>) -> Array1<f64> {
    let mut value_sum = Array1::<f64>::zeros(x.ncols());
    let mut weight_sum = Array1::<f64>::zeros(x.ncols());
    Zip::from(x.rows()).and(weights.rows()).for_each(|x_row, w_row| {
        Zip::from(&mut value_sum)
            .and(&mut weight_sum)
            .and(x_row)
            .and(w_row)
            .for_each(|vs, ws, &xv, &wv| {
                if wv != 0.0 {
                    *vs += wv * xv;
                    *ws += wv;
                }
            });
    });
    Zip::from(&value_sum)
        .and(&weight_sum)
        .map_collect(|&vs, &ws| if ws > 0.0 { vs / ws } else { 0.0 })
}

/// Total variance of the centered data, `Σ_j Σ_s x_c[s,j]² / n_samples`,
/// with zero-weight entries masked out so the published variance ratio stays
/// finite whatever value occupies those slots.
fn masked_total_variance(centered: &Array2<f64>, weights: Option<&Array2<f64>>) -> f64 {
    let n_samples = centered.nrows() as f64;
    match weights {
        None => centered.iter().map(|v| v * v).sum::<f64>() / n_samples,
        Some(w) => {
            Zip::from(centered).and(w).fold(0.0, |acc, &v, &wv| {
                if wv != 0.0 {
                    acc + v * v
                } else {
                    acc
                }
            }) / n_samples
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn seeded_matrix(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Array2::from_shape_fn((n_samples, n_features), |_| rng.gen_range(-1.0..1.0))
    }

    fn assert_rows_orthonormal(basis: &Array2<f64>, tol: f64) {
        let gram = basis.dot(&basis.t());
        for i in 0..gram.nrows() {
            for j in 0..gram.ncols() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = tol);
            }
        }
    }

    #[test]
    fn empca_rejects_too_many_components() {
        let data = seeded_matrix(6, 4, 1);
        let err = empca(&data, None, 5, 10, Some(0)).unwrap_err();
        assert_eq!(
            err,
            EmPcaError::InvalidDimensions {
                n_components: 5,
                n_features: 4
            }
        );
    }

    #[test]
    fn empca_rejects_mismatched_weights() {
        let data = seeded_matrix(6, 4, 1);
        let weights = Array2::from_elem((6, 3), 1.0);
        assert!(matches!(
            empca(&data, Some(&weights), 2, 10, Some(0)),
            Err(EmPcaError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn empca_basis_is_orthonormal() {
        let data = seeded_matrix(12, 6, 2);
        let (basis, coeff) = empca(&data, None, 3, 50, Some(7)).unwrap();
        assert_eq!(basis.dim(), (3, 6));
        assert_eq!(coeff.dim(), (12, 3));
        assert_rows_orthonormal(&basis, 1e-10);
    }

    #[test]
    fn empca_is_reproducible_for_a_seed() {
        let data = seeded_matrix(10, 5, 3);
        let (basis_a, coeff_a) = empca(&data, None, 2, 30, Some(11)).unwrap();
        let (basis_b, coeff_b) = empca(&data, None, 2, 30, Some(11)).unwrap();
        assert_eq!(basis_a, basis_b);
        assert_eq!(coeff_a, coeff_b);
    }

    #[test]
    fn unit_weights_match_the_unweighted_fast_path() {
        let data = seeded_matrix(10, 5, 4);
        let ones = Array2::from_elem((10, 5), 1.0);
        let (basis_w, coeff_w) = empca(&data, Some(&ones), 3, 40, Some(5)).unwrap();
        let (basis_u, coeff_u) = empca(&data, None, 3, 40, Some(5)).unwrap();
        for (a, b) in basis_w.iter().zip(basis_u.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-8);
        }
        for (a, b) in coeff_w.iter().zip(coeff_u.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-8);
        }
    }

    #[test]
    fn all_zero_weight_sample_gets_zero_coefficients() {
        let data = seeded_matrix(8, 4, 5);
        let mut weights = Array2::from_elem((8, 4), 1.0);
        weights.row_mut(3).fill(0.0);
        let (basis, coeff) = empca(&data, Some(&weights), 2, 30, Some(9)).unwrap();
        assert_rows_orthonormal(&basis, 1e-10);
        assert_eq!(coeff.row(3), array![0.0, 0.0]);
    }

    #[test]
    fn weighted_column_mean_skips_zero_weight_entries() {
        let x = array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]];
        let w = array![[1.0, 0.0], [1.0, 2.0], [2.0, 2.0]];
        let mean = weighted_column_mean(&x, &w);
        assert_abs_diff_eq!(mean[0], (1.0 + 3.0 + 10.0) / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mean[1], (8.0 + 12.0) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn weighted_column_mean_of_unobserved_feature_is_zero() {
        let x = array![[1.0, f64::INFINITY], [3.0, f64::NAN]];
        let w = array![[1.0, 0.0], [1.0, 0.0]];
        let mean = weighted_column_mean(&x, &w);
        assert_eq!(mean[1], 0.0);
    }

    #[test]
    fn transform_before_fit_is_rejected() {
        let model = EmPca::new();
        let x = seeded_matrix(4, 3, 6);
        assert_eq!(model.transform(&x, None).unwrap_err(), EmPcaError::NotFitted);
        assert_eq!(
            model.inverse_transform(&x).unwrap_err(),
            EmPcaError::NotFitted
        );
    }

    #[test]
    fn fit_requires_two_samples() {
        let mut model = EmPca::new();
        let x = seeded_matrix(1, 3, 6);
        assert!(matches!(
            model.fit(&x, None),
            Err(EmPcaError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn fit_publishes_variances_sorted_sensibly() {
        let data = seeded_matrix(20, 6, 8);
        let mut model = EmPca::with_config(EmPcaConfig {
            n_components: Some(3),
            max_iter: 80,
            random_seed: Some(21),
        });
        model.fit(&data, None).unwrap();
        let variance = model.explained_variance().unwrap();
        let ratio = model.explained_variance_ratio().unwrap();
        assert_eq!(variance.len(), 3);
        assert_eq!(ratio.len(), 3);
        for value in ratio.iter() {
            assert!(*value >= 0.0 && *value <= 1.0 + 1e-12);
        }
        // Components come out in decreasing variance order.
        assert!(variance[0] >= variance[1] - 1e-3);
        assert!(variance[1] >= variance[2] - 1e-3);
        assert!(ratio.sum() <= 1.0 + 1e-12);
    }

    #[test]
    fn default_component_count_is_full_rank() {
        let data = seeded_matrix(9, 4, 10);
        let mut model = EmPca::with_config(EmPcaConfig {
            random_seed: Some(3),
            ..EmPcaConfig::default()
        });
        model.fit(&data, None).unwrap();
        assert_eq!(model.components().unwrap().nrows(), 4);
    }
}
