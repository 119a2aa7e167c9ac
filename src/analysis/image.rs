//! Two-dimensional scalar planes used as working storage for transforms

use ndarray::{Array2, ArrayView2, Zip};

/// A dense scalar plane indexed `[x, y]`
///
/// Images carry no sky coordinates. Reads through [`Image::value`] clamp to
/// the nearest valid pixel, which is how the wavelet kernel and the peak
/// scan treat borders.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Array2<f64>,
}

impl Image {
    /// Create a zero-filled image
    pub fn zeros(size_x: usize, size_y: usize) -> Self {
        Self {
            data: Array2::zeros((size_x, size_y)),
        }
    }

    /// The 0x0 image returned when arithmetic operands disagree in size
    pub fn empty() -> Self {
        Self::zeros(0, 0)
    }

    /// Wrap an existing `[x, y]` array
    pub const fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Copy a borrowed `[x, y]` view
    pub fn from_view(view: ArrayView2<'_, f64>) -> Self {
        Self {
            data: view.to_owned(),
        }
    }

    /// Width in pixels
    pub fn size_x(&self) -> usize {
        self.data.dim().0
    }

    /// Height in pixels
    pub fn size_y(&self) -> usize {
        self.data.dim().1
    }

    /// Whether the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the underlying array
    pub const fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Mutably borrow the underlying array
    pub const fn as_array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Release the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Pixel value with both indices clamped into range
    ///
    /// Returns 0 for an empty image.
    pub fn value(&self, x: isize, y: isize) -> f64 {
        let (sx, sy) = self.data.dim();
        if sx == 0 || sy == 0 {
            return 0.0;
        }
        let cx = x.clamp(0, sx as isize - 1) as usize;
        let cy = y.clamp(0, sy as isize - 1) as usize;
        self.data.get([cx, cy]).copied().unwrap_or(0.0)
    }

    /// Overwrite one pixel; out-of-range writes are ignored
    pub fn set_value(&mut self, x: usize, y: usize, value: f64) {
        if let Some(pixel) = self.data.get_mut([x, y]) {
            *pixel = value;
        }
    }

    /// Largest pixel value, or negative infinity for an empty image
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest absolute pixel value
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }

    /// Mean pixel value, 0 for an empty image
    pub fn mean(&self) -> f64 {
        self.data.mean().unwrap_or(0.0)
    }

    /// Population standard deviation over every pixel
    pub fn standard_deviation(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.std(0.0)
    }

    /// Zero every coefficient with magnitude below `threshold`, keeping `(0, 0)`
    pub fn apply_threshold(&mut self, threshold: f64) {
        for ((x, y), value) in self.data.indexed_iter_mut() {
            if (x, y) != (0, 0) && value.abs() < threshold {
                *value = 0.0;
            }
        }
    }

    /// Zero small coefficients except the first coefficient of every tile
    pub fn apply_threshold_tiled(&mut self, threshold: f64, block_x: usize, block_y: usize) {
        let block_x = block_x.max(1);
        let block_y = block_y.max(1);
        for ((x, y), value) in self.data.indexed_iter_mut() {
            let tile_origin = x % block_x == 0 && y % block_y == 0;
            if !tile_origin && value.abs() < threshold {
                *value = 0.0;
            }
        }
    }

    /// Whether `(x, y)` is strictly greater than all eight clamped neighbours
    ///
    /// Border pixels see themselves as a neighbour and are never maxima.
    pub fn is_local_max(&self, x: usize, y: usize) -> bool {
        let (xi, yi) = (x as isize, y as isize);
        let centre = self.value(xi, yi);
        (-1..=1).all(|dx| {
            (-1..=1).all(|dy| (dx == 0 && dy == 0) || centre > self.value(xi + dx, yi + dy))
        })
    }

    /// Multiply every pixel by `factor`
    pub fn scale(&mut self, factor: f64) {
        self.data.mapv_inplace(|v| v * factor);
    }

    /// Pixelwise sum, or [`Image::empty`] when sizes differ
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a + b)
    }

    /// Pixelwise difference, or [`Image::empty`] when sizes differ
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a - b)
    }

    fn combine(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        if self.data.dim() != other.data.dim() {
            return Self::empty();
        }
        Self {
            data: Zip::from(&self.data)
                .and(&other.data)
                .map_collect(|&a, &b| op(a, b)),
        }
    }
}
