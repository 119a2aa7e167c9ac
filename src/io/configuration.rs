//! Numerical constants and persisted keyword names

// Mask derivation
/// Shear components below this magnitude count as missing data
pub const MASK_ZERO_TOLERANCE: f64 = 1e-10;

// Inpainting schedule
/// Rate of the erfc decay of the DCT threshold across iterations
pub const THRESHOLD_DECAY_RATE: f64 = 2.8;
/// Subtracted from log2 of the map width to get the automatic scale count
pub const AUTO_SCALE_OFFSET: usize = 5;
/// Both pixel subsets of a band need more samples than this for equalization
pub const MIN_EQUALIZATION_SAMPLES: usize = 2;

// B3-spline a trous kernel, centre tap first
/// Weight of the centre tap
pub const BSPLINE_CENTER: f64 = 3.0 / 8.0;
/// Weight of the taps at distance one gap
pub const BSPLINE_NEAR: f64 = 1.0 / 4.0;
/// Weight of the taps at distance two gaps
pub const BSPLINE_FAR: f64 = 1.0 / 16.0;

/// Smoothing widths at or below this value leave a map untouched
pub const MIN_GAUSSIAN_SIGMA: f64 = 0.001;

/// Denominators below this are treated as the projection centre
pub const PROJECTION_EPSILON: f64 = 1e-12;

// Grid metadata keywords (at most 8 characters)
/// Total number of galaxies binned into the map
pub const KEY_GALAXY_COUNT: &str = "NGALAXY";
/// Minimum right ascension of the patch
pub const KEY_RA_MIN: &str = "RAMIN";
/// Maximum right ascension of the patch
pub const KEY_RA_MAX: &str = "RAMAX";
/// Minimum declination of the patch
pub const KEY_DEC_MIN: &str = "DECMIN";
/// Maximum declination of the patch
pub const KEY_DEC_MAX: &str = "DECMAX";
/// Minimum redshift of the slice
pub const KEY_Z_MIN: &str = "ZMIN";
/// Maximum redshift of the slice
pub const KEY_Z_MAX: &str = "ZMAX";

// Inpainting provenance keywords
/// Whether B-modes were forced to zero inside gaps
pub const KEY_B_MODE_ZEROS: &str = "BMODGAP";
/// Whether wavelet variance was equalized per scale
pub const KEY_VARIANCE_PER_SCALE: &str = "VARPERSC";
/// Number of wavelet scales used during inpainting
pub const KEY_INPAINT_SCALES: &str = "NSCINP";
/// Number of inpainting iterations
pub const KEY_INPAINT_ITERATIONS: &str = "NITINP";
/// Gaussian smoothing width in pixels
pub const KEY_GAUSSIAN_SIGMA: &str = "STDGAUS";
/// Number of reduced-shear iterations
pub const KEY_REDUCED_SHEAR_ITERATIONS: &str = "NITREDSH";

/// Value written in place of a scale count chosen automatically
pub const AUTO_VALUE: &str = "Auto";
/// Software name recorded in every map header
pub const CREATOR: &str = "massmap";
/// Software version recorded in every map header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Peak catalog layout
/// Extension name of the peak table
pub const PEAK_TABLE_NAME: &str = "PEAKS";
/// Peak table column names
pub const PEAK_COLUMNS: [&str; 5] = ["RightAsc", "Declination", "redshift", "SNR", "scale"];
/// Peak table column units, in column order
pub const PEAK_UNITS: [&str; 5] = ["degree", "degree", "redshift", "snr", "a.u."];

// Command-line defaults
/// Log specification used when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Width of the inpainting progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
