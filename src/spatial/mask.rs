//! Observed/missing pixel mask derived from a shear map

use bitvec::prelude::*;

use crate::io::configuration::MASK_ZERO_TOLERANCE;
use crate::spatial::maps::ShearMap;

/// One bit per `(x, y)` pixel: set where shear was observed, clear in gaps
///
/// A pixel is a gap when both shear components are below
/// [`MASK_ZERO_TOLERANCE`] in magnitude. The mask is shared by every plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    bits: BitVec,
    size_x: usize,
    size_y: usize,
}

impl Mask {
    /// Derive the mask from the first two planes of a shear map
    pub fn from_shear(shear: &ShearMap) -> Self {
        let grid = shear.grid();
        let (size_x, size_y, _) = grid.dim();
        let mut bits = bitvec![0; size_x * size_y];
        for y in 0..size_y {
            for x in 0..size_x {
                let g1 = grid.bin_value(x as isize, y as isize, 0);
                let g2 = grid.bin_value(x as isize, y as isize, 1);
                let observed = g1.abs() >= MASK_ZERO_TOLERANCE || g2.abs() >= MASK_ZERO_TOLERANCE;
                bits.set(x + y * size_x, observed);
            }
        }
        Self {
            bits,
            size_x,
            size_y,
        }
    }

    /// Width in pixels
    pub const fn size_x(&self) -> usize {
        self.size_x
    }

    /// Height in pixels
    pub const fn size_y(&self) -> usize {
        self.size_y
    }

    /// Whether `(x, y)` holds observed data; false outside the mask
    pub fn is_observed(&self, x: usize, y: usize) -> bool {
        x < self.size_x && self.bits.get(x + y * self.size_x).as_deref() == Some(&true)
    }

    /// Number of observed pixels
    pub fn observed_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of gap pixels
    pub fn gap_count(&self) -> usize {
        self.bits.count_zeros()
    }

    /// Whether every pixel was observed
    pub fn is_complete(&self) -> bool {
        self.bits.all()
    }
}
