//! Reconstruction and detection algorithms built on the map and transform layers

/// Iterative DCT-thresholding inpainting of masked shear
pub mod inpainting;
/// Wavelet signal-to-noise peak detection
pub mod peaks;
