//! Sky and redshift extent of a mapped patch

use crate::io::error::{MappingError, Result};
use std::cmp::Ordering;

/// Right ascension, declination and redshift limits of a patch, in degrees
///
/// The type itself does not enforce `min < max`; entry points call
/// [`Boundaries::validate`] once before any work.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Boundaries {
    ra_min: f64,
    ra_max: f64,
    dec_min: f64,
    dec_max: f64,
    z_min: f64,
    z_max: f64,
}

impl Boundaries {
    /// Create boundaries from the six limits
    pub const fn new(
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
        z_min: f64,
        z_max: f64,
    ) -> Self {
        Self {
            ra_min,
            ra_max,
            dec_min,
            dec_max,
            z_min,
            z_max,
        }
    }

    /// Minimum right ascension
    pub const fn ra_min(&self) -> f64 {
        self.ra_min
    }

    /// Maximum right ascension
    pub const fn ra_max(&self) -> f64 {
        self.ra_max
    }

    /// Minimum declination
    pub const fn dec_min(&self) -> f64 {
        self.dec_min
    }

    /// Maximum declination
    pub const fn dec_max(&self) -> f64 {
        self.dec_max
    }

    /// Minimum redshift
    pub const fn z_min(&self) -> f64 {
        self.z_min
    }

    /// Maximum redshift
    pub const fn z_max(&self) -> f64 {
        self.z_max
    }

    /// Extent in right ascension
    pub fn ra_range(&self) -> f64 {
        self.ra_max - self.ra_min
    }

    /// Extent in declination
    pub fn dec_range(&self) -> f64 {
        self.dec_max - self.dec_min
    }

    /// Centre of the patch on the sky, used as the projection tangent point
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.ra_min + self.ra_max),
            0.5 * (self.dec_min + self.dec_max),
        )
    }

    /// Check that every axis is non-empty and the patch lies on the sky
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidBounds`] if any minimum is not below its
    /// maximum, if right ascension leaves `[0, 360]` or declination leaves `[-90, 90]`
    pub fn validate(&self) -> Result<()> {
        let axes = [
            ("ra", self.ra_min, self.ra_max),
            ("dec", self.dec_min, self.dec_max),
            ("z", self.z_min, self.z_max),
        ];
        for (name, min, max) in axes {
            // NaN limits fail too
            if min.partial_cmp(&max) != Some(Ordering::Less) {
                return Err(MappingError::InvalidBounds {
                    reason: format!("{name} minimum {min} is not below maximum {max}"),
                });
            }
        }

        if self.ra_min < 0.0 || self.ra_max > 360.0 {
            return Err(MappingError::InvalidBounds {
                reason: format!(
                    "ra range [{}, {}] outside [0, 360]",
                    self.ra_min, self.ra_max
                ),
            });
        }
        if self.dec_min < -90.0 || self.dec_max > 90.0 {
            return Err(MappingError::InvalidBounds {
                reason: format!(
                    "dec range [{}, {}] outside [-90, 90]",
                    self.dec_min, self.dec_max
                ),
            });
        }

        Ok(())
    }
}
