//! Multiscale peak detection on convergence maps
//!
//! The E-mode is decomposed into a wavelet pyramid; the coarsest plane sets a
//! single noise level, and every detail band is turned into a signal-to-noise
//! image weighted by the local galaxy density. Strict local maxima of those
//! images are placed on the sky through a tangent-plane projection.

use log::{info, warn};

use crate::analysis::image::Image;
use crate::analysis::wavelet::{auto_scale_count, transform_bspline};
use crate::io::error::{MappingError, Result, dimension_mismatch};
use crate::math::projection::{Gnomonic, SkyProjection};
use crate::spatial::grid::Grid;
use crate::spatial::maps::ConvergenceMap;

/// One detected peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRecord {
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
    /// Always 0: maps carry no per-pixel redshift
    pub redshift: f64,
    /// Density-weighted signal-to-noise ratio
    pub snr: f64,
    /// Index of the wavelet band the peak was found in
    pub scale: usize,
}

/// Signal-to-noise image of one band
///
/// Each pixel is `band / noise / sqrt(density)`; pixels without galaxies are 0.
/// Sizes are taken from `band`; density is read with clamping.
pub fn snr_image(band: &Image, noise: f64, density: &Image) -> Image {
    let mut snr = band.clone();
    for ((x, y), value) in snr.as_array_mut().indexed_iter_mut() {
        let local_density = density.value(x as isize, y as isize);
        *value = if local_density > 0.0 && noise > 0.0 {
            *value / noise / local_density.sqrt()
        } else {
            0.0
        };
    }
    snr
}

/// Peak finder over one convergence map and its galaxy density
#[derive(Debug, Clone)]
pub struct PeakCountAlgo {
    convergence: ConvergenceMap,
    density: Image,
    n_scales: usize,
}

impl PeakCountAlgo {
    /// Copy the inputs; density is read from the first plane of `density`
    ///
    /// # Errors
    ///
    /// Returns an error if the density grid is empty or lies on another pixel grid
    pub fn new(convergence: &ConvergenceMap, density: &Grid) -> Result<Self> {
        let kappa_dim = convergence.grid().dim();
        let density_dim = density.dim();
        if density_dim.2 == 0 {
            return Err(MappingError::MissingInput {
                what: "density map",
            });
        }
        if (kappa_dim.0, kappa_dim.1) != (density_dim.0, density_dim.1) {
            return Err(dimension_mismatch("peak count", kappa_dim, density_dim));
        }
        Ok(Self {
            convergence: convergence.clone(),
            density: density.plane(0),
            n_scales: auto_scale_count(kappa_dim.0),
        })
    }

    /// Number of pyramid planes, including the coarse plane used for noise
    pub const fn n_scales(&self) -> usize {
        self.n_scales
    }

    /// Standard deviation of the coarsest pyramid plane of the E-mode
    pub fn global_noise(&self) -> f64 {
        transform_bspline(&self.convergence.grid().plane(0), self.n_scales)
            .last()
            .map_or(0.0, Image::standard_deviation)
    }

    /// Signal-to-noise image of every detail band
    ///
    /// Empty when there are fewer than two scales or the noise estimate is not positive.
    pub fn snr_images(&self) -> Vec<Image> {
        let bands = transform_bspline(&self.convergence.grid().plane(0), self.n_scales);
        let Some((coarse, details)) = bands.split_last() else {
            return Vec::new();
        };
        let noise = coarse.standard_deviation();
        if details.is_empty() {
            return Vec::new();
        }
        if noise <= 0.0 {
            warn!("Peak detection skipped: coarse-scale noise is {noise}");
            return Vec::new();
        }
        details
            .iter()
            .map(|band| snr_image(band, noise, &self.density))
            .collect()
    }

    /// Sky position of a pixel centre, through the given projection
    pub fn pixel_to_sky(&self, x: usize, y: usize, projection: &dyn SkyProjection) -> (f64, f64) {
        let grid = self.convergence.grid();
        let bounds = grid.boundaries();
        let (ra_range, dec_range) = (bounds.ra_range(), bounds.dec_range());
        let (ra0, dec0) = bounds.center();

        let plane_x = ((x as f64 + 0.5) / grid.size_x() as f64 - 0.5) * ra_range.to_radians();
        let plane_y = ((y as f64 + 0.5) / grid.size_y() as f64 - 0.5) * dec_range.to_radians();
        let (ra, dec) = projection.deproject(plane_x, plane_y, ra0.to_radians(), dec0.to_radians());
        (ra.to_degrees(), dec.to_degrees())
    }

    /// Peaks located with the gnomonic projection
    pub fn peaks(&self) -> Vec<PeakRecord> {
        self.peaks_with(&Gnomonic)
    }

    /// Peaks located with any projection
    pub fn peaks_with(&self, projection: &dyn SkyProjection) -> Vec<PeakRecord> {
        let mut peaks = Vec::new();
        for (scale, snr) in self.snr_images().iter().enumerate() {
            for ((x, y), &value) in snr.as_array().indexed_iter() {
                if snr.is_local_max(x, y) {
                    let (ra, dec) = self.pixel_to_sky(x, y, projection);
                    peaks.push(PeakRecord {
                        ra,
                        dec,
                        redshift: 0.0,
                        snr: value,
                        scale,
                    });
                }
            }
        }
        info!(
            "Detected {} peaks over {} scales",
            peaks.len(),
            self.n_scales.saturating_sub(1)
        );
        peaks
    }
}
