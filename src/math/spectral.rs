//! Frequency-domain kernels: 2D FFT plans, the Kaiser-Squires filter and Gaussian convolution

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use num_traits::Zero;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use crate::io::configuration::MIN_GAUSSIAN_SIGMA;

/// Unnormalized forward and inverse complex FFT over a fixed `[x, y]` size
///
/// Plans come from a planner owned by the constructor call, so building two
/// plans on different threads never shares planner state.
#[derive(Clone)]
pub struct Fft2d {
    size_x: usize,
    size_y: usize,
    forward_x: Arc<dyn Fft<f64>>,
    forward_y: Arc<dyn Fft<f64>>,
    inverse_x: Arc<dyn Fft<f64>>,
    inverse_y: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2d")
            .field("size_x", &self.size_x)
            .field("size_y", &self.size_y)
            .finish_non_exhaustive()
    }
}

impl Fft2d {
    /// Plan transforms for an `size_x` by `size_y` field
    pub fn new(size_x: usize, size_y: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            size_x,
            size_y,
            forward_x: planner.plan_fft_forward(size_x),
            forward_y: planner.plan_fft_forward(size_y),
            inverse_x: planner.plan_fft_inverse(size_x),
            inverse_y: planner.plan_fft_inverse(size_y),
        }
    }

    /// Planned `(size_x, size_y)`
    pub const fn dim(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    /// Forward transform in place
    ///
    /// Arrays whose shape differs from the planned one are left untouched.
    pub fn forward(&self, data: &mut Array2<Complex64>) {
        self.process(data, &self.forward_x, &self.forward_y);
    }

    /// Inverse transform in place, without the `1 / (size_x * size_y)` factor
    pub fn inverse(&self, data: &mut Array2<Complex64>) {
        self.process(data, &self.inverse_x, &self.inverse_y);
    }

    fn process(
        &self,
        data: &mut Array2<Complex64>,
        along_x: &Arc<dyn Fft<f64>>,
        along_y: &Arc<dyn Fft<f64>>,
    ) {
        if data.dim() != (self.size_x, self.size_y) || data.is_empty() {
            return;
        }

        let mut buffer = Vec::with_capacity(self.size_x.max(self.size_y));
        for (axis, plan) in [(Axis(1), along_y), (Axis(0), along_x)] {
            for mut lane in data.lanes_mut(axis) {
                buffer.clear();
                buffer.extend(lane.iter().copied());
                plan.process(&mut buffer);
                lane.iter_mut().zip(&buffer).for_each(|(dst, src)| *dst = *src);
            }
        }
    }
}

/// Fold an FFT bin index onto the signed frequency range
pub fn signed_frequency(index: usize, size: usize) -> f64 {
    if 2 * index <= size {
        index as f64
    } else {
        index as f64 - size as f64
    }
}

/// Direction of a shear/convergence conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KsDirection {
    /// (`kappa_E`, `kappa_B`) to (`gamma1`, `gamma2`)
    ConvergenceToShear,
    /// (`gamma1`, `gamma2`) to (`kappa_E`, `kappa_B`)
    ShearToConvergence,
}

impl KsDirection {
    const fn sign(self) -> f64 {
        match self {
            Self::ConvergenceToShear => 1.0,
            Self::ShearToConvergence => -1.0,
        }
    }
}

/// Kaiser-Squires relation between shear and convergence on one pixel grid
///
/// The filter has unit modulus everywhere except the zero frequency, which
/// maps to zero: the mean of a converted field is always lost.
#[derive(Debug, Clone)]
pub struct KaiserSquires {
    fft: Fft2d,
    filter: Array2<Complex64>,
}

impl KaiserSquires {
    /// Build plans and the convergence-to-shear filter for the given size
    pub fn new(size_x: usize, size_y: usize) -> Self {
        let filter = Array2::from_shape_fn((size_x, size_y), |(i, j)| {
            let l1 = signed_frequency(i, size_x);
            let l2 = signed_frequency(j, size_y);
            let norm = l1.mul_add(l1, l2 * l2);
            if norm == 0.0 {
                Complex64::zero()
            } else {
                Complex64::new(l1.mul_add(l1, -(l2 * l2)) / norm, 2.0 * l1 * l2 / norm)
            }
        });
        Self {
            fft: Fft2d::new(size_x, size_y),
            filter,
        }
    }

    /// Planned `(size_x, size_y)`
    pub const fn dim(&self) -> (usize, usize) {
        self.fft.dim()
    }

    /// Convert the first two planes of `planes` and return a fresh two-plane field
    ///
    /// Inputs with fewer than two planes, or of another spatial size, give a
    /// zero field of the planned size.
    pub fn apply(&self, planes: ArrayView3<'_, f64>, direction: KsDirection) -> Array3<f64> {
        let (sx, sy) = self.dim();
        let mut output = Array3::zeros((sx, sy, 2));
        let (px, py, pz) = planes.dim();
        if pz < 2 || (px, py) != (sx, sy) || sx == 0 || sy == 0 {
            return output;
        }

        let real = planes.index_axis(Axis(2), 0);
        let imag = planes.index_axis(Axis(2), 1);
        let mut field = Zip::from(&real)
            .and(&imag)
            .map_collect(|&re, &im| Complex64::new(re, im));

        self.fft.forward(&mut field);
        let sign = direction.sign();
        Zip::from(&mut field).and(&self.filter).for_each(|value, p| {
            *value *= Complex64::new(p.re, sign * p.im);
        });
        self.fft.inverse(&mut field);

        let norm = (sx * sy) as f64;
        for ((x, y), value) in field.indexed_iter() {
            if let Some(out) = output.get_mut([x, y, 0]) {
                *out = value.re / norm;
            }
            if let Some(out) = output.get_mut([x, y, 1]) {
                *out = value.im / norm;
            }
        }
        output
    }
}

// Unnormalized Gaussian weight along one axis; a width at or below the
// minimum collapses to a unit impulse at the centre
fn axis_weight(index: usize, centre: usize, sigma: f64) -> f64 {
    if sigma <= MIN_GAUSSIAN_SIGMA {
        return if index == centre { 1.0 } else { 0.0 };
    }
    let d = (index as f64 - centre as f64) / sigma;
    (-0.5 * d * d).exp()
}

/// Normalized Gaussian kernel peaking at pixel `(size_x / 2, size_y / 2)`
///
/// An axis whose width is at or below [`MIN_GAUSSIAN_SIGMA`] is not spread.
pub fn gaussian_kernel(size_x: usize, size_y: usize, sigma_x: f64, sigma_y: f64) -> Array2<f64> {
    let (cx, cy) = (size_x / 2, size_y / 2);
    let mut kernel = Array2::from_shape_fn((size_x, size_y), |(i, j)| {
        axis_weight(i, cx, sigma_x) * axis_weight(j, cy, sigma_y)
    });
    let total = kernel.sum();
    if total > 0.0 {
        kernel.mapv_inplace(|v| v / total);
    }
    kernel
}

/// Cyclic convolution of a plane with a centred Gaussian
///
/// The product of the two spectra puts the kernel centre at the origin, so the
/// result is read back shifted by half the plane in each axis.
pub fn gaussian_smooth(
    plane: ArrayView2<'_, f64>,
    sigma_x: f64,
    sigma_y: f64,
    fft: &Fft2d,
) -> Array2<f64> {
    let (sx, sy) = plane.dim();
    if (sx, sy) != fft.dim() || plane.is_empty() {
        return plane.to_owned();
    }

    let mut signal = plane.mapv(|v| Complex64::new(v, 0.0));
    let mut kernel = gaussian_kernel(sx, sy, sigma_x, sigma_y).mapv(|v| Complex64::new(v, 0.0));
    fft.forward(&mut signal);
    fft.forward(&mut kernel);
    Zip::from(&mut signal).and(&kernel).for_each(|s, k| *s *= *k);
    fft.inverse(&mut signal);

    let norm = (sx * sy) as f64;
    let (hx, hy) = (sx / 2, sy / 2);
    Array2::from_shape_fn((sx, sy), |(i, j)| {
        signal
            .get([(i + hx) % sx, (j + hy) % sy])
            .map_or(0.0, |v| v.re / norm)
    })
}
