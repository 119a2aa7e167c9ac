//! Sky-to-tangent-plane projections used to place map pixels on the sky
//!
//! Angles are in radians on both sides of the projection; callers convert
//! from and to degrees.

use crate::io::configuration::PROJECTION_EPSILON;

/// A projection of the celestial sphere onto a plane tangent at `(ra0, dec0)`
pub trait SkyProjection {
    /// Sky position to plane coordinates, `None` for points on the far hemisphere
    fn project(&self, ra: f64, dec: f64, ra0: f64, dec0: f64) -> Option<(f64, f64)>;

    /// Plane coordinates back to a sky position
    fn deproject(&self, x: f64, y: f64, ra0: f64, dec0: f64) -> (f64, f64);
}

/// Gnomonic (TAN) projection
#[derive(Debug, Clone, Copy, Default)]
pub struct Gnomonic;

impl SkyProjection for Gnomonic {
    fn project(&self, ra: f64, dec: f64, ra0: f64, dec0: f64) -> Option<(f64, f64)> {
        let (sin_dec, cos_dec) = dec.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let (sin_dra, cos_dra) = (ra - ra0).sin_cos();

        let cos_c = sin_dec0.mul_add(sin_dec, cos_dec0 * cos_dec * cos_dra);
        if cos_c <= PROJECTION_EPSILON {
            return None;
        }
        let x = cos_dec * sin_dra / cos_c;
        let y = cos_dec0.mul_add(sin_dec, -(sin_dec0 * cos_dec * cos_dra)) / cos_c;
        Some((x, y))
    }

    fn deproject(&self, x: f64, y: f64, ra0: f64, dec0: f64) -> (f64, f64) {
        let rho = x.hypot(y);
        if rho < PROJECTION_EPSILON {
            return (ra0, dec0);
        }
        let c = rho.atan();
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();

        let dec = cos_c
            .mul_add(sin_dec0, y * sin_c * cos_dec0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let ra = ra0
            + (x * sin_c).atan2(rho.mul_add(cos_dec0 * cos_c, -(y * sin_dec0 * sin_c)));
        (ra, dec)
    }
}
