//! Tests for FITS grid persistence and the peak catalog

#[cfg(test)]
mod tests {
    use fitsio::FitsFile;
    use massmap::MappingError;
    use massmap::algorithm::peaks::PeakRecord;
    use massmap::io::fits::{Provenance, read_grid, write_grid, write_peak_catalog};
    use massmap::spatial::{Boundaries, Grid};
    use ndarray::Array3;
    use tempfile::tempdir;

    fn sample_grid() -> Grid {
        let values = Array3::from_shape_fn((6, 4, 2), |(x, y, z)| {
            x as f64 + 10.0 * y as f64 + 100.0 * z as f64
        });
        Grid::new(values, Boundaries::new(34.0, 36.0, -5.5, -4.5, 0.2, 1.3), 12_345)
    }

    // Tests values, limits and galaxy count survive a write and read
    // Verified by writing axes in [x, y, z] order
    #[test]
    fn test_grid_round_trip() {
        let Ok(dir) = tempdir() else {
            unreachable!("temporary directory unavailable");
        };
        let path = dir.path().join("nested").join("kappa.fits");
        let grid = sample_grid();

        assert!(write_grid(&grid, &path, false, None).is_ok());
        let Ok(loaded) = read_grid(&path) else {
            unreachable!("written grid unreadable");
        };

        assert_eq!(loaded, grid);
        assert!((loaded.bin_value(5, 3, 1) - 135.0).abs() < f64::EPSILON);
    }

    // Tests provenance and world-coordinate keywords are written
    // Verified by skipping the provenance block
    #[test]
    fn test_header_keywords() {
        let Ok(dir) = tempdir() else {
            unreachable!("temporary directory unavailable");
        };
        let path = dir.path().join("kappa.fits");
        let provenance = Provenance {
            b_mode_zeros: true,
            inpainting_iterations: 100,
            gaussian_sigma: 1.5,
            ..Provenance::default()
        };
        assert!(write_grid(&sample_grid(), &path, false, Some(&provenance)).is_ok());

        let Ok(mut fptr) = FitsFile::open(&path) else {
            unreachable!("written grid unreadable");
        };
        let Ok(hdu) = fptr.primary_hdu() else {
            unreachable!("missing primary HDU");
        };
        let scales: Result<String, _> = hdu.read_key(&mut fptr, "NSCINP");
        let iterations: Result<i64, _> = hdu.read_key(&mut fptr, "NITINP");
        let sigma: Result<f64, _> = hdu.read_key(&mut fptr, "STDGAUS");
        let b_mode: Result<String, _> = hdu.read_key(&mut fptr, "BMODGAP");
        let ctype: Result<String, _> = hdu.read_key(&mut fptr, "CTYPE1");
        let crpix: Result<i64, _> = hdu.read_key(&mut fptr, "CRPIX1");
        let cd: Result<f64, _> = hdu.read_key(&mut fptr, "CD1_1");

        assert_eq!(scales.ok().as_deref(), Some("Auto"));
        assert_eq!(iterations.ok(), Some(100));
        assert!(sigma.is_ok_and(|s| (s - 1.5).abs() < f64::EPSILON));
        assert_eq!(b_mode.ok().as_deref(), Some("True"));
        assert_eq!(ctype.ok().as_deref(), Some("RA---TAN"));
        assert_eq!(crpix.ok(), Some(3));
        assert!(cd.is_ok_and(|v| (v - 2.0 / 6.0).abs() < 1e-12));
    }

    // Tests existing files are kept unless overwriting is requested
    // Verified by ignoring the overwrite flag
    #[test]
    fn test_overwrite_protection() {
        let Ok(dir) = tempdir() else {
            unreachable!("temporary directory unavailable");
        };
        let path = dir.path().join("kappa.fits");
        let grid = sample_grid();
        assert!(write_grid(&grid, &path, false, None).is_ok());

        assert!(matches!(
            write_grid(&grid, &path, false, None),
            Err(MappingError::FileSystem { .. })
        ));
        assert!(write_grid(&grid, &path, true, None).is_ok());
    }

    // Tests empty grids and missing files are rejected
    // Verified by writing a zero-sized image
    #[test]
    fn test_invalid_inputs() {
        let Ok(dir) = tempdir() else {
            unreachable!("temporary directory unavailable");
        };
        let empty = Grid::zeros(0, 4, 2, Boundaries::default(), 0);

        assert!(matches!(
            write_grid(&empty, &dir.path().join("empty.fits"), false, None),
            Err(MappingError::InvalidParameter { .. })
        ));
        assert!(matches!(
            read_grid(&dir.path().join("missing.fits")),
            Err(MappingError::MapLoad { .. })
        ));
    }

    // Tests the catalog holds one row per peak with units
    // Verified by writing the scale into the SNR column
    #[test]
    fn test_peak_catalog() {
        let Ok(dir) = tempdir() else {
            unreachable!("temporary directory unavailable");
        };
        let path = dir.path().join("peaks.fits");
        let peaks = [
            PeakRecord {
                ra: 35.1,
                dec: -5.0,
                redshift: 0.0,
                snr: 4.2,
                scale: 0,
            },
            PeakRecord {
                ra: 35.7,
                dec: -4.8,
                redshift: 0.0,
                snr: 2.5,
                scale: 1,
            },
        ];
        assert!(write_peak_catalog(&path, &peaks, false).is_ok());

        let Ok(mut fptr) = FitsFile::open(&path) else {
            unreachable!("written catalog unreadable");
        };
        let Ok(hdu) = fptr.hdu("PEAKS") else {
            unreachable!("missing peak table");
        };
        let snr: Result<Vec<f64>, _> = hdu.read_col(&mut fptr, "SNR");
        let scale: Result<Vec<f64>, _> = hdu.read_col(&mut fptr, "scale");
        let unit: Result<String, _> = hdu.read_key(&mut fptr, "TUNIT1");

        assert_eq!(snr.ok(), Some(vec![4.2, 2.5]));
        assert_eq!(scale.ok(), Some(vec![0.0, 1.0]));
        assert_eq!(unit.ok().as_deref(), Some("degree"));

        assert!(write_peak_catalog(&dir.path().join("none.fits"), &[], false).is_ok());
    }
}
