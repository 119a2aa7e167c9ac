//! Sky-agnostic plane processing

/// Discrete cosine transform pair
pub mod dct;
/// Two-dimensional scalar planes
pub mod image;
/// B-spline "a trous" wavelet pyramid
pub mod wavelet;
