//! Undecimated B3-spline "a trous" wavelet pyramid

use ndarray::Array2;

use crate::analysis::image::Image;
use crate::io::configuration::{AUTO_SCALE_OFFSET, BSPLINE_CENTER, BSPLINE_FAR, BSPLINE_NEAR};

/// Scale count used when none is given: `floor(log2(size)) - 5`, at least 0
pub fn auto_scale_count(size: usize) -> usize {
    size.checked_ilog2()
        .map_or(0, |log| (log as usize).saturating_sub(AUTO_SCALE_OFFSET))
}

// One separable pass of the dilated kernel along x (along_x) or y
fn smooth_axis(image: &Image, gap: isize, along_x: bool) -> Image {
    let (sx, sy) = (image.size_x(), image.size_y());
    let data = Array2::from_shape_fn((sx, sy), |(x, y)| {
        let (x, y) = (x as isize, y as isize);
        let at = |offset: isize| {
            if along_x {
                image.value(x + offset, y)
            } else {
                image.value(x, y + offset)
            }
        };
        BSPLINE_CENTER.mul_add(
            at(0),
            BSPLINE_NEAR.mul_add(
                at(-gap) + at(gap),
                BSPLINE_FAR * (at(gap.saturating_mul(-2)) + at(gap.saturating_mul(2))),
            ),
        )
    });
    Image::from_array(data)
}

/// Smooth with the 5-tap B3-spline kernel, holes of `2^step` pixels, x then y
///
/// Holes wider than the image reach the clamped edges, so the gap is capped
/// at the image size.
pub fn bspline_smooth(image: &Image, step: u32) -> Image {
    let widest = image.size_x().max(image.size_y()).max(1);
    let gap = 1_usize.checked_shl(step).map_or(widest, |gap| gap.min(widest));
    let gap = isize::try_from(gap).unwrap_or(isize::MAX / 4);
    smooth_axis(&smooth_axis(image, gap, true), gap, false)
}

/// Largest scale count a `size_x` by `size_y` image supports: `floor(log2(min)) + 1`
pub fn max_scale_count(size_x: usize, size_y: usize) -> usize {
    size_x
        .min(size_y)
        .checked_ilog2()
        .map_or(0, |log| log as usize + 1)
}

/// Decompose an image into `n_scales` planes
///
/// Planes `0..n_scales - 1` are detail bands, each the difference between two
/// successive smoothings; the last plane is the final smoothed image. With
/// `n_scales == 1` the only plane is a copy of the input, and 0 gives nothing.
pub fn transform_bspline(image: &Image, n_scales: usize) -> Vec<Image> {
    if n_scales == 0 {
        return Vec::new();
    }

    let mut bands = Vec::with_capacity(n_scales);
    let mut current = image.clone();
    for step in 0..n_scales - 1 {
        let smoothed = bspline_smooth(&current, u32::try_from(step).unwrap_or(u32::MAX));
        bands.push(current.subtract(&smoothed));
        current = smoothed;
    }
    bands.push(current);
    bands
}

/// Sum every plane of a pyramid back into one image
///
/// Returns an empty image for an empty pyramid or planes of mixed sizes.
pub fn recons_bspline(bands: &[Image]) -> Image {
    let Some((first, rest)) = bands.split_first() else {
        return Image::empty();
    };
    rest.iter().fold(first.clone(), |acc, band| acc.add(band))
}
