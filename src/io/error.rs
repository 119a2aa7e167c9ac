//! Error types for map construction, transforms and persistence

use std::fmt;
use std::path::PathBuf;

/// Main error type for all mass-mapping operations
#[derive(Debug)]
pub enum MappingError {
    /// Failed to read a map from a FITS file
    MapLoad {
        /// Path to the FITS file
        path: PathBuf,
        /// Underlying FITS error
        source: fitsio::errors::Error,
    },

    /// Failed to write a map or catalog to a FITS file
    MapExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying FITS error
        source: fitsio::errors::Error,
    },

    /// Failed to save a quick-look preview image
    PreviewExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Sky or redshift region is empty or outside the valid sky range
    InvalidBounds {
        /// Description of the failed check
        reason: String,
    },

    /// Two inputs that must share a pixel grid do not
    ///
    /// Raised before any iteration starts, never mid-run.
    DimensionMismatch {
        /// Operation that received the inputs
        operation: &'static str,
        /// Expected (x, y, z) sizes
        expected: (usize, usize, usize),
        /// Provided (x, y, z) sizes
        found: (usize, usize, usize),
    },

    /// No usable shear or convergence data was supplied
    MissingInput {
        /// What was missing
        what: &'static str,
    },

    /// Algorithm parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MapLoad { path, source } => {
                write!(f, "Failed to load map '{}': {source}", path.display())
            }
            Self::MapExport { path, source } => {
                write!(f, "Failed to export map to '{}': {source}", path.display())
            }
            Self::PreviewExport { path, source } => {
                write!(
                    f,
                    "Failed to export preview to '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidBounds { reason } => write!(f, "Invalid boundaries: {reason}"),
            Self::DimensionMismatch {
                operation,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {operation}: expected {}x{}x{}, found {}x{}x{}",
                    expected.0, expected.1, expected.2, found.0, found.1, found.2
                )
            }
            Self::MissingInput { what } => write!(f, "Missing input: {what}"),
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MapLoad { source, .. } | Self::MapExport { source, .. } => Some(source),
            Self::PreviewExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mapping results
pub type Result<T> = std::result::Result<T, MappingError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MappingError {
    MappingError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> MappingError {
    MappingError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a dimension mismatch error from two (x, y, z) shapes
pub const fn dimension_mismatch(
    operation: &'static str,
    expected: (usize, usize, usize),
    found: (usize, usize, usize),
) -> MappingError {
    MappingError::DimensionMismatch {
        operation,
        expected,
        found,
    }
}
