//! Dense multi-plane field over a sky patch, shared by shear, convergence and density maps
//!
//! A grid owns an `(x, y, z)` array, a copy of the patch [`Boundaries`] and the
//! number of galaxies binned into it (0 when unknown). Rebinning, offset removal,
//! smoothing and border padding all mutate the grid in place.

use ndarray::{Array3, Axis, Slice};

use crate::analysis::image::Image;
use crate::io::configuration::MIN_GAUSSIAN_SIGMA;
use crate::io::error::{Result, dimension_mismatch, invalid_parameter};
use crate::math::spectral::{Fft2d, gaussian_smooth};
use crate::spatial::boundaries::Boundaries;

/// Dense `(x, y, z)` field with patch metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    values: Array3<f64>,
    boundaries: Boundaries,
    galaxy_count: u64,
}

impl Grid {
    /// Wrap an `[x, y, z]` array
    pub const fn new(values: Array3<f64>, boundaries: Boundaries, galaxy_count: u64) -> Self {
        Self {
            values,
            boundaries,
            galaxy_count,
        }
    }

    /// Create a zero-filled grid
    pub fn zeros(
        size_x: usize,
        size_y: usize,
        size_z: usize,
        boundaries: Boundaries,
        galaxy_count: u64,
    ) -> Self {
        Self::new(
            Array3::zeros((size_x, size_y, size_z)),
            boundaries,
            galaxy_count,
        )
    }

    /// Create a grid from a flat array in `x + y * size_x + z * size_x * size_y` order
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len()` differs from `size_x * size_y * size_z`
    pub fn from_flat(
        data: &[f64],
        size_x: usize,
        size_y: usize,
        size_z: usize,
        boundaries: Boundaries,
        galaxy_count: u64,
    ) -> Result<Self> {
        let expected = size_x * size_y * size_z;
        if data.len() != expected {
            return Err(invalid_parameter(
                "data",
                &data.len(),
                &format!("expected {expected} values for a {size_x}x{size_y}x{size_z} grid"),
            ));
        }

        // Flat order has x fastest, so it is the C layout of a (z, y, x) array
        let zyx = Array3::from_shape_vec((size_z, size_y, size_x), data.to_vec()).map_err(|e| {
            invalid_parameter("data", &data.len(), &e)
        })?;
        let values = zyx.reversed_axes().as_standard_layout().into_owned();
        Ok(Self::new(values, boundaries, galaxy_count))
    }

    /// Values in `x + y * size_x + z * size_x * size_y` order
    pub fn to_flat(&self) -> Vec<f64> {
        self.values.t().iter().copied().collect()
    }

    /// Width in pixels
    pub fn size_x(&self) -> usize {
        self.values.dim().0
    }

    /// Height in pixels
    pub fn size_y(&self) -> usize {
        self.values.dim().1
    }

    /// Number of planes
    pub fn size_z(&self) -> usize {
        self.values.dim().2
    }

    /// `(size_x, size_y, size_z)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Patch limits
    pub const fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Galaxies binned into the grid, 0 if unknown
    pub const fn galaxy_count(&self) -> u64 {
        self.galaxy_count
    }

    /// Borrow the `[x, y, z]` array
    pub const fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Mutably borrow the `[x, y, z]` array
    pub const fn values_mut(&mut self) -> &mut Array3<f64> {
        &mut self.values
    }

    /// Value at `(x, y, z)` with every index clamped to the nearest valid one
    ///
    /// Returns 0 for a grid with an empty axis.
    pub fn bin_value(&self, x: isize, y: isize, z: isize) -> f64 {
        let (sx, sy, sz) = self.values.dim();
        if sx == 0 || sy == 0 || sz == 0 {
            return 0.0;
        }
        let cx = x.clamp(0, sx as isize - 1) as usize;
        let cy = y.clamp(0, sy as isize - 1) as usize;
        let cz = z.clamp(0, sz as isize - 1) as usize;
        self.values.get([cx, cy, cz]).copied().unwrap_or(0.0)
    }

    /// Overwrite one value; out-of-range writes are ignored
    pub fn set_bin_value(&mut self, x: usize, y: usize, z: usize, value: f64) {
        if let Some(bin) = self.values.get_mut([x, y, z]) {
            *bin = value;
        }
    }

    /// Copy plane `z` out as an image, or an empty image if `z` is out of range
    pub fn plane(&self, z: usize) -> Image {
        if z >= self.size_z() {
            return Image::empty();
        }
        Image::from_view(self.values.index_axis(Axis(2), z))
    }

    /// Overwrite plane `z` with an image of the same spatial size
    ///
    /// # Errors
    ///
    /// Returns an error if `z` is out of range or the image size differs
    pub fn set_plane(&mut self, z: usize, image: &Image) -> Result<()> {
        let (sx, sy, sz) = self.dim();
        if z >= sz || (image.size_x(), image.size_y()) != (sx, sy) {
            return Err(dimension_mismatch(
                "set_plane",
                (sx, sy, sz),
                (image.size_x(), image.size_y(), z + 1),
            ));
        }
        self.values
            .index_axis_mut(Axis(2), z)
            .assign(image.as_array());
        Ok(())
    }

    /// Mean of each plane
    pub fn mean_values(&self) -> Vec<f64> {
        self.values
            .axis_iter(Axis(2))
            .map(|plane| plane.mean().unwrap_or(0.0))
            .collect()
    }

    /// Subtract `offsets[z]` from every value of plane `z`
    ///
    /// # Errors
    ///
    /// Returns an error if there is not exactly one offset per plane
    pub fn remove_offset(&mut self, offsets: &[f64]) -> Result<()> {
        if offsets.len() != self.size_z() {
            return Err(invalid_parameter(
                "offsets",
                &offsets.len(),
                &format!("expected one offset per plane ({})", self.size_z()),
            ));
        }
        for (mut plane, offset) in self.values.axis_iter_mut(Axis(2)).zip(offsets) {
            plane.mapv_inplace(|v| v - offset);
        }
        Ok(())
    }

    /// Rebin by a power-of-4 area factor so galaxies per bin approach the target
    ///
    /// The area factor grows by 4 while the binned density stays closer to the
    /// target than the unbinned one. Bins are summed. Returns the applied linear
    /// factor, or 1 when the galaxy count is unknown, the grid is already denser
    /// than the target, or the result would leave one pixel or less on an axis.
    pub fn pixelate_to_density(&mut self, target_galaxies_per_bin: f64) -> usize {
        let (sx, sy, _) = self.dim();
        if self.galaxy_count == 0 || sx == 0 || sy == 0 {
            return 1;
        }
        let per_bin = self.galaxy_count as f64 / (sx * sy) as f64;
        if per_bin > target_galaxies_per_bin {
            return 1;
        }

        let unbinned_gap = (target_galaxies_per_bin - per_bin).abs();
        let mut factor = 1_usize;
        loop {
            // Past the smaller axis the result is one pixel wide whatever happens next
            if factor > sx.min(sy) {
                return 1;
            }
            let next_area = (4 * factor * factor) as f64;
            if per_bin.mul_add(next_area, -target_galaxies_per_bin).abs() >= unbinned_gap {
                break;
            }
            factor *= 2;
        }

        if factor == 1 || sx / factor <= 1 || sy / factor <= 1 {
            return 1;
        }
        self.rebin(factor, factor, false);
        factor
    }

    /// Rebin by `2^x_pow` along x and `2^y_pow` along y, averaging each block
    ///
    /// Trailing pixels that do not fill a whole block are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if both powers are 0 or a factor exceeds the grid size
    pub fn pixelate(&mut self, x_pow: u32, y_pow: u32) -> Result<()> {
        if x_pow == 0 && y_pow == 0 {
            return Err(invalid_parameter(
                "pixelate",
                &"(0, 0)",
                &"at least one axis must be rebinned",
            ));
        }
        let (sx, sy, _) = self.dim();
        let factor_x = 1_usize.checked_shl(x_pow).filter(|&f| f <= sx);
        let factor_y = 1_usize.checked_shl(y_pow).filter(|&f| f <= sy);
        let (Some(factor_x), Some(factor_y)) = (factor_x, factor_y) else {
            return Err(invalid_parameter(
                "pixelate",
                &format!("({x_pow}, {y_pow})"),
                &format!("binning factor exceeds grid size {sx}x{sy}"),
            ));
        };
        self.rebin(factor_x, factor_y, true);
        Ok(())
    }

    fn rebin(&mut self, factor_x: usize, factor_y: usize, average: bool) {
        let (sx, sy, sz) = self.dim();
        let (nx, ny) = (sx / factor_x, sy / factor_y);
        let scale = if average {
            1.0 / (factor_x * factor_y) as f64
        } else {
            1.0
        };
        let mut binned = Array3::zeros((nx, ny, sz));
        for ((x, y, z), value) in binned.indexed_iter_mut() {
            let block = self
                .values
                .slice_axis(Axis(0), Slice::from(x * factor_x..(x + 1) * factor_x))
                .slice_axis(Axis(1), Slice::from(y * factor_y..(y + 1) * factor_y))
                .index_axis(Axis(2), z)
                .sum();
            *value = block * scale;
        }
        self.values = binned;
    }

    /// Smooth every plane with a normalized Gaussian of the given pixel widths
    ///
    /// An axis whose width is at or below [`MIN_GAUSSIAN_SIGMA`] is left unsmoothed;
    /// when both are, the grid is untouched.
    pub fn apply_gaussian_filter(&mut self, sigma_x: f64, sigma_y: f64) {
        let (sx, sy, _) = self.dim();
        if (sigma_x <= MIN_GAUSSIAN_SIGMA && sigma_y <= MIN_GAUSSIAN_SIGMA) || sx == 0 || sy == 0 {
            return;
        }
        let fft = Fft2d::new(sx, sy);
        for mut plane in self.values.axis_iter_mut(Axis(2)) {
            let smoothed = gaussian_smooth(plane.view(), sigma_x, sigma_y, &fft);
            plane.assign(&smoothed);
        }
    }

    /// Isotropic form of [`Grid::apply_gaussian_filter`]
    pub fn apply_gaussian_smoothing(&mut self, sigma: f64) {
        self.apply_gaussian_filter(sigma, sigma);
    }

    /// Double both spatial axes, centring the data inside a zero margin
    pub fn add_borders(&mut self) {
        let (sx, sy, sz) = self.dim();
        let (nx, ny) = (2 * sx, 2 * sy);
        let (ox, oy) = (nx / 4, ny / 4);
        let mut padded = Array3::zeros((nx, ny, sz));
        padded
            .slice_axis_mut(Axis(0), Slice::from(ox..ox + sx))
            .slice_axis_mut(Axis(1), Slice::from(oy..oy + sy))
            .assign(&self.values);
        self.values = padded;
    }

    /// Halve both spatial axes, keeping the central region written by [`Grid::add_borders`]
    pub fn remove_borders(&mut self) {
        let (sx, sy, _) = self.dim();
        let (nx, ny) = (sx / 2, sy / 2);
        let (ox, oy) = (nx / 2, ny / 2);
        self.values = self
            .values
            .slice_axis(Axis(0), Slice::from(ox..ox + nx))
            .slice_axis(Axis(1), Slice::from(oy..oy + ny))
            .to_owned();
    }
}
