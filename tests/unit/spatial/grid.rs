//! Tests for grid construction, clamped access, rebinning, smoothing and borders

#[cfg(test)]
mod tests {
    use massmap::spatial::{Boundaries, Grid};
    use ndarray::Array3;

    fn bounds() -> Boundaries {
        Boundaries::new(10.0, 12.0, -1.0, 1.0, 0.2, 0.8)
    }

    fn constant_grid(size: usize) -> Grid {
        let mut values = Array3::zeros((size, size, 2));
        for ((_, _, z), value) in values.indexed_iter_mut() {
            *value = if z == 0 { 1.0 } else { 2.0 };
        }
        Grid::new(values, bounds(), 1000)
    }

    // Tests per-plane means of a constant grid are exact
    // Verified by averaging over all planes together
    #[test]
    fn test_mean_values_of_constant_grid() {
        let grid = constant_grid(16);

        assert_eq!(grid.mean_values(), vec![1.0, 2.0]);
    }

    // Tests explicit rebinning halves both axes and keeps constant values
    // Verified by summing instead of averaging blocks
    #[test]
    fn test_pixelate_halves_dimensions() {
        let mut grid = constant_grid(16);

        assert!(grid.pixelate(1, 1).is_ok());

        assert_eq!(grid.dim(), (8, 8, 2));
        assert_eq!(grid.mean_values(), vec![1.0, 2.0]);
        assert!((grid.bin_value(3, 5, 1) - 2.0).abs() < f64::EPSILON);
        assert_eq!(grid.galaxy_count(), 1000);
    }

    // Tests rebinning one axis only and rejected factors
    // Verified by dropping the factor-size check
    #[test]
    fn test_pixelate_single_axis_and_errors() {
        let mut grid = constant_grid(16);
        assert!(grid.pixelate(2, 0).is_ok());
        assert_eq!(grid.dim(), (4, 16, 2));

        assert!(grid.pixelate(0, 0).is_err());
        assert!(grid.pixelate(3, 0).is_err());
        assert!(grid.pixelate(0, 70).is_err());
        assert_eq!(grid.dim(), (4, 16, 2));
    }

    // Tests automatic rebinning chooses the factor closest to the target density
    // Verified by always doubling once
    #[test]
    fn test_pixelate_to_density() {
        let mut grid = Grid::new(Array3::from_elem((16, 16, 1), 1.0), bounds(), 256);

        assert_eq!(grid.pixelate_to_density(4.0), 2);
        assert_eq!(grid.dim(), (8, 8, 1));
        assert!((grid.bin_value(0, 0, 0) - 4.0).abs() < f64::EPSILON);

        let mut dense = Grid::new(Array3::from_elem((16, 16, 1), 1.0), bounds(), 256);
        assert_eq!(dense.pixelate_to_density(0.5), 1);
        assert_eq!(dense.dim(), (16, 16, 1));

        let mut unknown = Grid::new(Array3::from_elem((16, 16, 1), 1.0), bounds(), 0);
        assert_eq!(unknown.pixelate_to_density(4.0), 1);
    }

    // Tests the successive density targets of a 16x16 map with 1e9 galaxies
    // Verified by stopping at the factor closest to the target instead of comparing with the unbinned gap
    #[test]
    fn test_pixelate_to_density_sequence() {
        let mut values = Array3::zeros((16, 16, 2));
        for ((_, _, z), value) in values.indexed_iter_mut() {
            *value = if z == 0 { 1.0 } else { 3.0 };
        }
        let galaxies = 1_000_000_000_u64;
        let mut grid = Grid::new(values, bounds(), galaxies);
        let per_bin = galaxies as f64 / 256.0;

        assert_eq!(grid.pixelate_to_density(per_bin / 2.0), 1);
        assert_eq!(grid.pixelate_to_density(per_bin * 1.5), 1);
        assert_eq!(grid.dim(), (16, 16, 2));

        assert_eq!(grid.pixelate_to_density(per_bin * 5.0), 2);
        assert_eq!(grid.dim(), (8, 8, 2));
        assert_eq!(grid.mean_values(), vec![4.0, 12.0]);

        assert_eq!(grid.pixelate_to_density(per_bin * 4.0 * 10.0), 4);
        assert_eq!(grid.dim(), (2, 2, 2));
        assert_eq!(grid.mean_values(), vec![64.0, 192.0]);

        // A single remaining pixel is refused
        assert_eq!(grid.pixelate_to_density(galaxies as f64), 1);
        assert_eq!(grid.dim(), (2, 2, 2));
        assert_eq!(grid.galaxy_count(), galaxies);
    }

    // Tests a target that would collapse a small map to one pixel leaves it alone
    // Verified by allowing the factor to reach the map size
    #[test]
    fn test_pixelate_to_density_keeps_more_than_one_pixel() {
        let mut grid = Grid::new(Array3::from_elem((4, 4, 1), 1.0), bounds(), 1_000);

        assert_eq!(grid.pixelate_to_density(1_000.0), 1);
        assert_eq!(grid.dim(), (4, 4, 1));
        assert!((grid.bin_value(3, 3, 0) - 1.0).abs() < f64::EPSILON);
    }

    // Tests out-of-range reads return the nearest valid value
    // Verified by returning zero outside the grid
    #[test]
    fn test_bin_value_clamps_indices() {
        let data: Vec<f64> = (0..24).map(f64::from).collect();
        let grid = Grid::from_flat(&data, 4, 3, 2, bounds(), 0).unwrap_or_else(|e| {
            unreachable!("valid flat data rejected: {e}");
        });

        assert!((grid.bin_value(-5, 1, 0) - grid.bin_value(0, 1, 0)).abs() < f64::EPSILON);
        assert!((grid.bin_value(9, 9, 9) - grid.bin_value(3, 2, 1)).abs() < f64::EPSILON);
        assert!((grid.bin_value(2, -1, 7) - grid.bin_value(2, 0, 1)).abs() < f64::EPSILON);
    }

    // Tests flat input uses x-fastest ordering and round-trips
    // Verified by building the array in (x, y, z) C order
    #[test]
    fn test_from_flat_ordering() {
        let data: Vec<f64> = (0..24).map(f64::from).collect();
        let Ok(grid) = Grid::from_flat(&data, 4, 3, 2, bounds(), 7) else {
            unreachable!("valid flat data rejected");
        };

        // x + y * 4 + z * 12
        assert!((grid.bin_value(1, 0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((grid.bin_value(0, 1, 0) - 4.0).abs() < f64::EPSILON);
        assert!((grid.bin_value(3, 2, 1) - 23.0).abs() < f64::EPSILON);
        assert_eq!(grid.to_flat(), data);

        assert!(Grid::from_flat(&data, 4, 4, 2, bounds(), 7).is_err());
    }

    // Tests offsets are subtracted per plane
    // Verified by subtracting the first offset from every plane
    #[test]
    fn test_remove_offset() {
        let mut grid = constant_grid(4);

        assert!(grid.remove_offset(&[1.0, 0.5]).is_ok());
        assert_eq!(grid.mean_values(), vec![0.0, 1.5]);
        assert!(grid.remove_offset(&[1.0]).is_err());
    }

    // Tests Gaussian smoothing keeps a delta's peak in place and conserves its sum
    // Verified by skipping the half-plane recentring
    #[test]
    fn test_gaussian_filter_keeps_peak_position() {
        let mut grid = Grid::zeros(15, 15, 1, bounds(), 0);
        grid.set_bin_value(7, 7, 0, 1.0);

        grid.apply_gaussian_filter(1.5, 1.5);

        let values = grid.values();
        let argmax = values
            .indexed_iter()
            .fold(((0, 0, 0), f64::NEG_INFINITY), |best, (idx, &v)| {
                if v > best.1 { (idx, v) } else { best }
            })
            .0;
        assert_eq!(argmax, (7, 7, 0));
        assert!((values.sum() - 1.0).abs() < 1e-9);
        assert!(grid.bin_value(7, 7, 0) < 1.0);
    }

    // Tests smoothing leaves a constant field unchanged and ignores tiny widths
    // Verified by dropping the kernel normalization
    #[test]
    fn test_gaussian_filter_preserves_constant_field() {
        let mut grid = constant_grid(16);
        grid.apply_gaussian_filter(2.0, 3.0);
        for ((_, _, z), &value) in grid.values().indexed_iter() {
            let expected = if z == 0 { 1.0 } else { 2.0 };
            assert!((value - expected).abs() < 1e-9);
        }

        let mut untouched = Grid::zeros(8, 8, 1, bounds(), 0);
        untouched.set_bin_value(2, 2, 0, 1.0);
        let before = untouched.clone();
        untouched.apply_gaussian_smoothing(0.0);
        assert_eq!(untouched, before);
    }

    // Tests a negligible width on one axis smooths along the other axis only
    // Verified by skipping the filter when either width is negligible
    #[test]
    fn test_gaussian_filter_single_axis() {
        let mut grid = Grid::zeros(15, 15, 1, bounds(), 0);
        grid.set_bin_value(7, 7, 0, 1.0);

        grid.apply_gaussian_filter(2.0, 0.0);

        for ((x, y, _), &value) in grid.values().indexed_iter() {
            if y != 7 {
                assert!(value.abs() < 1e-12, "leak to ({x}, {y}): {value}");
            }
        }
        assert!(grid.bin_value(7, 7, 0) < 1.0);
        assert!(grid.bin_value(5, 7, 0) > 0.01);
        assert!((grid.bin_value(6, 7, 0) - grid.bin_value(8, 7, 0)).abs() < 1e-12);
        assert!((grid.values().sum() - 1.0).abs() < 1e-9);
    }

    // Tests adding then removing borders restores the grid
    // Verified by placing data at the padded origin
    #[test]
    fn test_borders_round_trip() {
        let data: Vec<f64> = (0..128).map(f64::from).collect();
        let Ok(original) = Grid::from_flat(&data, 8, 8, 2, bounds(), 3) else {
            unreachable!("valid flat data rejected");
        };
        let mut grid = original.clone();

        grid.add_borders();
        assert_eq!(grid.dim(), (16, 16, 2));
        assert!(grid.bin_value(0, 0, 0).abs() < f64::EPSILON);
        assert!((grid.bin_value(4, 4, 0) - original.bin_value(0, 0, 0)).abs() < f64::EPSILON);
        let total: f64 = grid.values().sum();
        assert!((total - original.values().sum()).abs() < 1e-9);

        grid.remove_borders();
        assert_eq!(grid, original);
    }

    // Tests plane extraction and replacement
    // Verified by writing the image into plane 0 regardless of index
    #[test]
    fn test_plane_access() {
        let mut grid = constant_grid(4);
        let mut plane = grid.plane(1);
        assert_eq!((plane.size_x(), plane.size_y()), (4, 4));
        assert!(grid.plane(2).is_empty());

        plane.scale(3.0);
        assert!(grid.set_plane(1, &plane).is_ok());
        assert_eq!(grid.mean_values(), vec![1.0, 6.0]);
        assert!(grid.set_plane(2, &plane).is_err());
    }
}
