//! Tests for the DCT pair over whole planes and tiles

#[cfg(test)]
mod tests {
    use massmap::analysis::dct::{
        Dct2d, perform_dct, perform_dct_blocks, perform_idct, perform_idct_blocks,
        validate_block_size,
    };
    use massmap::analysis::image::Image;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_image(sx: usize, sy: usize, seed: u64) -> Image {
        let mut rng = StdRng::seed_from_u64(seed);
        Image::from_array(Array2::from_shape_fn((sx, sy), |_| rng.random_range(-2.0..2.0)))
    }

    fn max_difference(a: &Image, b: &Image) -> f64 {
        a.subtract(b).max_abs()
    }

    // Tests the inverse undoes the forward transform on whole planes
    // Verified by omitting the scale factor on the inverse
    #[test]
    fn test_whole_plane_round_trip() {
        for (sx, sy) in [(8, 8), (6, 10), (5, 3)] {
            let image = random_image(sx, sy, 42);

            let restored = perform_idct(&perform_dct(&image));

            assert_eq!((restored.size_x(), restored.size_y()), (sx, sy));
            assert!(max_difference(&restored, &image) < 1e-12);
        }
    }

    // Tests a constant plane concentrates in the DC coefficient
    // Verified by dropping the mirrored half of the FFT buffer
    #[test]
    fn test_constant_plane_has_only_dc() {
        let (sx, sy) = (8, 4);
        let image = Image::from_array(Array2::from_elem((sx, sy), 1.5));

        let coefficients = perform_dct(&image);

        let dc = 2.0 * ((sx * sy) as f64).sqrt() * 1.5;
        assert!((coefficients.value(0, 0) - dc).abs() < 1e-12);
        for ((x, y), &value) in coefficients.as_array().indexed_iter() {
            if (x, y) != (0, 0) {
                assert!(value.abs() < 1e-12, "({x}, {y}) = {value}");
            }
        }
    }

    // Tests a single cosine mode lands on its own coefficient
    // Verified by using a DCT-I kernel
    #[test]
    fn test_cosine_mode_is_sparse() {
        let n = 8;
        let image = Image::from_array(Array2::from_shape_fn((n, n), |(x, _)| {
            (std::f64::consts::PI * 3.0 * (2 * x + 1) as f64 / (2 * n) as f64).cos()
        }));

        let coefficients = perform_dct(&image);

        let significant: Vec<(usize, usize)> = coefficients
            .as_array()
            .indexed_iter()
            .filter(|(_, v)| v.abs() > 1e-9)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(significant, vec![(3, 0)]);
    }

    // Tests tiled transforms round-trip and differ from the whole-plane transform
    // Verified by sharing one tile across the plane
    #[test]
    fn test_block_round_trip() {
        let image = random_image(8, 12, 7);

        let Ok(coefficients) = perform_dct_blocks(&image, 4, 4) else {
            unreachable!("divisor block size rejected");
        };
        let Ok(restored) = perform_idct_blocks(&coefficients, 4, 4) else {
            unreachable!("divisor block size rejected");
        };

        assert!(max_difference(&restored, &image) < 1e-12);
        assert!(max_difference(&coefficients, &perform_dct(&image)) > 1e-6);
    }

    // Tests block sizes must be non-zero divisors
    // Verified by accepting any block smaller than the plane
    #[test]
    fn test_invalid_block_sizes() {
        let image = random_image(8, 8, 1);

        assert!(perform_dct_blocks(&image, 3, 4).is_err());
        assert!(perform_idct_blocks(&image, 0, 4).is_err());
        assert!(validate_block_size(8, 8, 8, 2).is_ok());
        assert!(validate_block_size(8, 8, 16, 8).is_err());
    }

    // Tests prepared plans match the free functions and skip other sizes
    // Verified by transposing the plan axes
    #[test]
    fn test_prepared_plan() {
        let image = random_image(6, 4, 3);
        let plan = Dct2d::new(6, 4);

        assert_eq!(plan.dim(), (6, 4));
        assert!(max_difference(&plan.forward(&image), &perform_dct(&image)) < 1e-15);

        let other = random_image(4, 6, 3);
        assert_eq!(plan.forward(&other), other);
    }
}
