//! Weak-lensing mass mapping on binned sky patches
//!
//! Shear and convergence maps are related through the Kaiser-Squires filter.
//! Shear with missing regions is inverted by sparse DCT inpainting, and
//! convergence peaks are counted on a B-spline wavelet pyramid.

#![forbid(unsafe_code)]

/// Inpainting reconstruction and peak detection
pub mod algorithm;
/// Scalar planes, DCT and wavelet transforms
pub mod analysis;
/// Persistence, command line, progress reporting and error handling
pub mod io;
/// Spectral kernels, sky projections and special functions
pub mod math;
/// Patch boundaries, grids, typed maps and masks
pub mod spatial;

pub use io::error::{MappingError, Result};
