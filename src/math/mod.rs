//! Mathematical utilities for transforms and projections

/// Error function approximations
pub mod probability;
/// Sky-to-plane projections
pub mod projection;
/// FFT plans, Kaiser-Squires filter and Gaussian convolution
pub mod spectral;
