//! Orthogonal-scaled 2D DCT-II / DCT-III pair, over a whole plane or tile by tile
//!
//! Each 1D transform is computed from a complex FFT of twice the length. The
//! pair is scaled by `1 / (2 * sqrt(size_x * size_y))` in both directions so
//! that the inverse undoes the forward transform exactly.

use ndarray::{Array2, Axis, Slice};
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::analysis::image::Image;
use crate::io::error::{Result, invalid_parameter};

struct Dct1d {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    // e^{-i pi k / 2N}
    twiddles: Vec<Complex64>,
}

impl Dct1d {
    fn new(len: usize, planner: &mut FftPlanner<f64>) -> Self {
        let twiddles = (0..len)
            .map(|k| Complex64::from_polar(1.0, -PI * k as f64 / (2 * len) as f64))
            .collect();
        Self {
            len,
            forward: planner.plan_fft_forward(2 * len),
            inverse: planner.plan_fft_inverse(2 * len),
            twiddles,
        }
    }

    // Unnormalized DCT-II: y_k = 2 sum x_n cos(pi k (2n + 1) / 2N)
    fn dct2(&self, values: &mut [f64], buffer: &mut Vec<Complex64>) {
        buffer.clear();
        buffer.extend(values.iter().map(|&v| Complex64::new(v, 0.0)));
        buffer.extend(values.iter().rev().map(|&v| Complex64::new(v, 0.0)));
        self.forward.process(buffer);
        for ((out, spectrum), twiddle) in values.iter_mut().zip(buffer.iter()).zip(&self.twiddles) {
            *out = (spectrum * twiddle).re;
        }
    }

    // Unnormalized DCT-III: y_k = x_0 + 2 sum_{n >= 1} x_n cos(pi n (2k + 1) / 2N)
    fn dct3(&self, values: &mut [f64], buffer: &mut Vec<Complex64>) {
        let n = self.len;
        buffer.clear();
        buffer.resize(2 * n, Complex64::new(0.0, 0.0));
        for (k, (&value, twiddle)) in values.iter().zip(&self.twiddles).enumerate() {
            if k == 0 {
                if let Some(slot) = buffer.first_mut() {
                    *slot = Complex64::new(value, 0.0);
                }
            } else {
                if let Some(slot) = buffer.get_mut(k) {
                    *slot = value * twiddle.conj();
                }
                if let Some(slot) = buffer.get_mut(2 * n - k) {
                    *slot = value * *twiddle;
                }
            }
        }
        self.inverse.process(buffer);
        for (out, z) in values.iter_mut().zip(buffer.iter()) {
            *out = z.re;
        }
    }
}

/// Prepared DCT plans for one plane size
pub struct Dct2d {
    along_x: Dct1d,
    along_y: Dct1d,
    scale: f64,
}

impl std::fmt::Debug for Dct2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dct2d")
            .field("size_x", &self.along_x.len)
            .field("size_y", &self.along_y.len)
            .finish_non_exhaustive()
    }
}

impl Dct2d {
    /// Plan transforms for `size_x` by `size_y` planes
    pub fn new(size_x: usize, size_y: usize) -> Self {
        let mut planner = FftPlanner::new();
        let area = (size_x * size_y) as f64;
        Self {
            along_x: Dct1d::new(size_x, &mut planner),
            along_y: Dct1d::new(size_y, &mut planner),
            scale: if area > 0.0 { 0.5 / area.sqrt() } else { 0.0 },
        }
    }

    /// Planned `(size_x, size_y)`
    pub const fn dim(&self) -> (usize, usize) {
        (self.along_x.len, self.along_y.len)
    }

    /// Forward DCT-II of a plane of the planned size
    ///
    /// Planes of any other size come back unchanged.
    pub fn forward(&self, image: &Image) -> Image {
        self.run(image, Dct1d::dct2)
    }

    /// Inverse (DCT-III) of a plane of the planned size
    pub fn inverse(&self, image: &Image) -> Image {
        self.run(image, Dct1d::dct3)
    }

    fn run(&self, image: &Image, kernel: fn(&Dct1d, &mut [f64], &mut Vec<Complex64>)) -> Image {
        let mut data = image.as_array().clone();
        self.transform_in_place(&mut data, kernel);
        Image::from_array(data)
    }

    fn transform_in_place(
        &self,
        data: &mut Array2<f64>,
        kernel: fn(&Dct1d, &mut [f64], &mut Vec<Complex64>),
    ) {
        if data.dim() != self.dim() || data.is_empty() {
            return;
        }
        let mut buffer = Vec::new();
        let mut lane_values = Vec::new();
        for (axis, plan) in [(Axis(1), &self.along_y), (Axis(0), &self.along_x)] {
            for mut lane in data.lanes_mut(axis) {
                lane_values.clear();
                lane_values.extend(lane.iter().copied());
                kernel(plan, &mut lane_values, &mut buffer);
                lane.iter_mut()
                    .zip(&lane_values)
                    .for_each(|(dst, src)| *dst = *src);
            }
        }
        data.mapv_inplace(|v| v * self.scale);
    }
}

/// Whole-plane forward DCT
pub fn perform_dct(image: &Image) -> Image {
    Dct2d::new(image.size_x(), image.size_y()).forward(image)
}

/// Whole-plane inverse DCT
pub fn perform_idct(image: &Image) -> Image {
    Dct2d::new(image.size_x(), image.size_y()).inverse(image)
}

/// Forward DCT of every `block_x` by `block_y` tile independently
///
/// # Errors
///
/// Returns an error if a block side is 0 or does not divide the plane size
pub fn perform_dct_blocks(image: &Image, block_x: usize, block_y: usize) -> Result<Image> {
    transform_blocks(image, block_x, block_y, Dct1d::dct2)
}

/// Inverse DCT of every `block_x` by `block_y` tile independently
///
/// # Errors
///
/// Returns an error if a block side is 0 or does not divide the plane size
pub fn perform_idct_blocks(image: &Image, block_x: usize, block_y: usize) -> Result<Image> {
    transform_blocks(image, block_x, block_y, Dct1d::dct3)
}

/// Check that a tile size evenly divides a plane
///
/// # Errors
///
/// Returns an error if a block side is 0 or does not divide the plane size
pub fn validate_block_size(
    size_x: usize,
    size_y: usize,
    block_x: usize,
    block_y: usize,
) -> Result<()> {
    if block_x == 0
        || block_y == 0
        || !size_x.is_multiple_of(block_x)
        || !size_y.is_multiple_of(block_y)
    {
        return Err(invalid_parameter(
            "block_size",
            &format!("{block_x}x{block_y}"),
            &format!("must be non-zero and divide the {size_x}x{size_y} plane"),
        ));
    }
    Ok(())
}

fn transform_blocks(
    image: &Image,
    block_x: usize,
    block_y: usize,
    kernel: fn(&Dct1d, &mut [f64], &mut Vec<Complex64>),
) -> Result<Image> {
    let (sx, sy) = (image.size_x(), image.size_y());
    validate_block_size(sx, sy, block_x, block_y)?;

    let plan = Dct2d::new(block_x, block_y);
    let mut data = image.as_array().clone();
    for bx in (0..sx).step_by(block_x) {
        for by in (0..sy).step_by(block_y) {
            let (rows, cols) = (Slice::from(bx..bx + block_x), Slice::from(by..by + block_y));
            let mut tile = data
                .slice_axis(Axis(0), rows)
                .slice_axis(Axis(1), cols)
                .to_owned();
            plan.transform_in_place(&mut tile, kernel);
            data.slice_axis_mut(Axis(0), rows)
                .slice_axis_mut(Axis(1), cols)
                .assign(&tile);
        }
    }
    Ok(Image::from_array(data))
}
