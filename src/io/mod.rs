//! Input/output, configuration and error handling

/// Command-line parsing and pipelines
pub mod cli;
/// Numeric constants and keyword names
pub mod configuration;
/// Error taxonomy
pub mod error;
/// FITS map and catalog persistence
pub mod fits;
/// PNG previews
pub mod image;
/// Inpainting progress bar
pub mod progress;
