//! Sparse iterative inpainting of convergence maps from shear with missing regions
//!
//! Each iteration hard-thresholds the DCT of the current (kappa_E, kappa_B)
//! estimate with a decaying threshold, optionally equalizes the wavelet
//! variance inside and outside the gaps, and then projects back onto the data:
//! observed shear is restored wherever the mask is set and the result is
//! inverted into the next convergence estimate.

use log::{debug, info};

use crate::analysis::dct::{Dct2d, perform_dct_blocks, perform_idct_blocks, validate_block_size};
use crate::analysis::image::Image;
use crate::analysis::wavelet::{
    auto_scale_count, max_scale_count, recons_bspline, transform_bspline,
};
use crate::io::configuration::{MIN_EQUALIZATION_SAMPLES, THRESHOLD_DECAY_RATE};
use crate::io::error::{Result, computation_error, dimension_mismatch, invalid_parameter};
use crate::math::probability::erfc;
use crate::math::spectral::KaiserSquires;
use crate::spatial::grid::Grid;
use crate::spatial::maps::{ConvergenceMap, ShearMap};
use crate::spatial::mask::Mask;

/// Parameters fixed when the algorithm is constructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InpaintingConfig {
    /// Wavelet scales for variance equalization, 0 for `floor(log2(size_x)) - 5`
    ///
    /// At most `floor(log2(min(size_x, size_y))) + 1`.
    pub n_scales: usize,
    /// Threshold reached on the final iterations
    pub min_threshold: f64,
    /// Starting threshold, `None` for the largest E-mode DCT magnitude
    pub max_threshold: Option<f64>,
}

impl Default for InpaintingConfig {
    fn default() -> Self {
        Self {
            n_scales: 0,
            min_threshold: 0.0,
            max_threshold: None,
        }
    }
}

/// Per-run switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InpaintingOptions {
    /// Number of threshold/projection iterations
    pub iterations: usize,
    /// Equalize E-mode wavelet variance inside and outside the gaps
    pub sigma_bounds: bool,
    /// Force the B-mode to zero inside the gaps
    pub b_mode_zeros: bool,
    /// Transform `(block_x, block_y)` tiles independently instead of the whole plane
    pub block_size: Option<(usize, usize)>,
}

impl Default for InpaintingOptions {
    fn default() -> Self {
        Self {
            iterations: 100,
            sigma_bounds: false,
            b_mode_zeros: false,
            block_size: None,
        }
    }
}

/// Hook for reporting inpainting progress outside the algorithm
pub trait InpaintingObserver {
    /// Called once before the first iteration
    fn on_start(&mut self, _iterations: usize) {}

    /// Called after each completed iteration, numbered from 1
    fn on_iteration(&mut self, _iteration: usize, _threshold: f64) {}

    /// Called once after the last iteration
    fn on_finish(&mut self) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl InpaintingObserver for NoopObserver {}

/// Threshold for iteration `iteration` of `iterations`
///
/// Decays from `max_threshold` towards `min_threshold` as
/// `min + (max - min) * erfc(2.8 * iteration / iterations)`.
pub fn threshold_schedule(
    iteration: usize,
    iterations: usize,
    min_threshold: f64,
    max_threshold: f64,
) -> f64 {
    if iterations == 0 {
        return max_threshold;
    }
    let progress = iteration as f64 / iterations as f64;
    (max_threshold - min_threshold).mul_add(erfc(THRESHOLD_DECAY_RATE * progress), min_threshold)
}

/// Observed shear where the mask is set, reconstructed shear in the gaps
pub fn consistency_projection(
    observed: &ShearMap,
    reconstructed: &ShearMap,
    mask: &Mask,
) -> ShearMap {
    let mut corrected = reconstructed.clone();
    let observed_values = observed.grid().values();
    for ((x, y, z), value) in corrected.grid_mut().values_mut().indexed_iter_mut() {
        if mask.is_observed(x, y)
            && let Some(&original) = observed_values.get([x, y, z])
        {
            *value = original;
        }
    }
    corrected
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Rescale the gap pixels of every detail band so their spread matches the observed pixels
///
/// The coarsest plane is left alone. A band is skipped unless both pixel sets
/// have more than [`MIN_EQUALIZATION_SAMPLES`] members and the gap spread is positive.
pub fn equalize_wavelet_variance(plane: &Image, mask: &Mask, n_scales: usize) -> Image {
    let mut bands = transform_bspline(plane, n_scales);
    let detail_count = bands.len().saturating_sub(1);

    for band in bands.iter_mut().take(detail_count) {
        let mut observed = Vec::new();
        let mut missing = Vec::new();
        for ((x, y), &value) in band.as_array().indexed_iter() {
            if mask.is_observed(x, y) {
                observed.push(value);
            } else {
                missing.push(value);
            }
        }
        if observed.len() <= MIN_EQUALIZATION_SAMPLES || missing.len() <= MIN_EQUALIZATION_SAMPLES
        {
            continue;
        }
        let missing_std = population_std(&missing);
        if missing_std <= 0.0 {
            continue;
        }
        let ratio = population_std(&observed) / missing_std;
        for ((x, y), value) in band.as_array_mut().indexed_iter_mut() {
            if !mask.is_observed(x, y) {
                *value *= ratio;
            }
        }
    }

    if bands.is_empty() {
        plane.clone()
    } else {
        recons_bspline(&bands)
    }
}

/// Inpainting state: the observed data, its mask and prepared transforms
#[derive(Debug)]
pub struct InpaintingAlgo {
    shear: ShearMap,
    convergence: ConvergenceMap,
    mask: Mask,
    n_scales: usize,
    min_threshold: f64,
    max_threshold: Option<f64>,
    ks: KaiserSquires,
}

impl InpaintingAlgo {
    /// Copy the inputs and derive the mask from zero-shear pixels
    ///
    /// # Errors
    ///
    /// Returns an error if the maps lie on different pixel grids or the
    /// minimum threshold is negative or not finite
    pub fn new(
        shear: &ShearMap,
        convergence: &ConvergenceMap,
        config: InpaintingConfig,
    ) -> Result<Self> {
        let shear_dim = shear.grid().dim();
        let kappa_dim = convergence.grid().dim();
        if (shear_dim.0, shear_dim.1) != (kappa_dim.0, kappa_dim.1) {
            return Err(dimension_mismatch("inpainting", shear_dim, kappa_dim));
        }
        if !config.min_threshold.is_finite() || config.min_threshold < 0.0 {
            return Err(invalid_parameter(
                "min_threshold",
                &config.min_threshold,
                &"must be finite and non-negative",
            ));
        }

        let (sx, sy, _) = shear_dim;
        let scale_limit = max_scale_count(sx, sy);
        let n_scales = if config.n_scales == 0 {
            auto_scale_count(sx).min(scale_limit)
        } else {
            config.n_scales
        };
        if n_scales > scale_limit {
            return Err(invalid_parameter(
                "n_scales",
                &n_scales,
                &format!("a {sx}x{sy} map supports at most {scale_limit} scales"),
            ));
        }
        let mask = Mask::from_shear(shear);
        debug!(
            "Inpainting mask: {} observed, {} missing pixels",
            mask.observed_count(),
            mask.gap_count()
        );

        Ok(Self {
            shear: shear.clone(),
            convergence: convergence.clone(),
            mask,
            n_scales,
            min_threshold: config.min_threshold,
            max_threshold: config.max_threshold,
            ks: KaiserSquires::new(sx, sy),
        })
    }

    /// Observed-pixel mask
    pub const fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Wavelet scale count after resolving the automatic choice
    pub const fn n_scales(&self) -> usize {
        self.n_scales
    }

    /// Run without progress reporting
    ///
    /// # Errors
    ///
    /// Returns an error if the block size does not tile the map
    pub fn perform_inpainting(&self, options: &InpaintingOptions) -> Result<ConvergenceMap> {
        self.perform_inpainting_with(options, &mut NoopObserver)
    }

    /// Run the full iteration schedule and return the reconstructed convergence
    ///
    /// Zero iterations return a copy of the input convergence.
    ///
    /// # Errors
    ///
    /// Returns an error if the block size does not tile the map, checked before
    /// the first iteration, or if the reconstruction is not finite
    pub fn perform_inpainting_with(
        &self,
        options: &InpaintingOptions,
        observer: &mut dyn InpaintingObserver,
    ) -> Result<ConvergenceMap> {
        let (sx, sy, _) = self.convergence.grid().dim();
        if let Some((block_x, block_y)) = options.block_size {
            validate_block_size(sx, sy, block_x, block_y)?;
        }
        if options.iterations == 0 {
            return Ok(self.convergence.clone());
        }

        info!(
            "Inpainting {sx}x{sy} map: {} iterations, {} scales",
            options.iterations, self.n_scales
        );
        observer.on_start(options.iterations);

        let transform = match options.block_size {
            Some((block_x, block_y)) => PlaneTransform::Blocks(block_x, block_y),
            None => PlaneTransform::Whole(Dct2d::new(sx, sy)),
        };

        let mut estimate = self.convergence.clone();
        let mut max_threshold = self.max_threshold;

        for iteration in 0..options.iterations {
            let mut dct_e = transform.forward(&estimate.grid().plane(0))?;
            let mut dct_b = transform.forward(&estimate.grid().plane(1))?;

            let lambda_max = *max_threshold.get_or_insert_with(|| dct_e.max_abs());
            let lambda = match transform {
                PlaneTransform::Whole(_) if iteration + 1 == options.iterations => {
                    self.min_threshold
                }
                _ => threshold_schedule(
                    iteration,
                    options.iterations,
                    self.min_threshold,
                    lambda_max,
                ),
            };

            match transform {
                PlaneTransform::Whole(_) => {
                    dct_e.apply_threshold(lambda);
                    dct_b.apply_threshold(lambda);
                }
                PlaneTransform::Blocks(block_x, block_y) => {
                    dct_e.apply_threshold_tiled(lambda, block_x, block_y);
                    dct_b.apply_threshold_tiled(lambda, block_x, block_y);
                }
            }

            let mut kappa_e = transform.inverse(&dct_e)?;
            let mut kappa_b = transform.inverse(&dct_b)?;

            if options.sigma_bounds {
                kappa_e = equalize_wavelet_variance(&kappa_e, &self.mask, self.n_scales);
            }
            if options.b_mode_zeros {
                for ((x, y), value) in kappa_b.as_array_mut().indexed_iter_mut() {
                    if !self.mask.is_observed(x, y) {
                        *value = 0.0;
                    }
                }
            }

            let mut grid = Grid::zeros(
                sx,
                sy,
                2,
                *self.convergence.grid().boundaries(),
                self.convergence.grid().galaxy_count(),
            );
            grid.set_plane(0, &kappa_e)?;
            grid.set_plane(1, &kappa_b)?;
            let thresholded = ConvergenceMap::new(grid)?;

            let reconstructed = thresholded.to_shear_with(&self.ks);
            let corrected = consistency_projection(&self.shear, &reconstructed, &self.mask);
            estimate = corrected.to_convergence_with(&self.ks);

            debug!(
                "Inpainting iteration {}/{}: threshold {lambda:.6e}",
                iteration + 1,
                options.iterations
            );
            observer.on_iteration(iteration + 1, lambda);
        }

        observer.on_finish();
        if estimate.grid().values().iter().any(|v| !v.is_finite()) {
            return Err(computation_error(
                "inpainting",
                &"reconstruction contains non-finite values",
            ));
        }
        Ok(estimate)
    }
}

enum PlaneTransform {
    Whole(Dct2d),
    Blocks(usize, usize),
}

impl PlaneTransform {
    fn forward(&self, image: &Image) -> Result<Image> {
        match self {
            Self::Whole(dct) => Ok(dct.forward(image)),
            Self::Blocks(block_x, block_y) => perform_dct_blocks(image, *block_x, *block_y),
        }
    }

    fn inverse(&self, image: &Image) -> Result<Image> {
        match self {
            Self::Whole(dct) => Ok(dct.inverse(image)),
            Self::Blocks(block_x, block_y) => perform_idct_blocks(image, *block_x, *block_y),
        }
    }
}
