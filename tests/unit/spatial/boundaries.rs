//! Tests for patch boundary accessors and validation

#[cfg(test)]
mod tests {
    use massmap::MappingError;
    use massmap::spatial::Boundaries;

    // Tests accessors return exactly the constructor arguments
    // Verified by swapping dec_min and dec_max in the constructor
    #[test]
    fn test_accessors_return_constructor_arguments() {
        let bounds = Boundaries::new(1.3, 10.0, -20.2, 42.9, 0.5, 1.2);

        assert!((bounds.ra_min() - 1.3).abs() < f64::EPSILON);
        assert!((bounds.ra_max() - 10.0).abs() < f64::EPSILON);
        assert!((bounds.dec_min() - -20.2).abs() < f64::EPSILON);
        assert!((bounds.dec_max() - 42.9).abs() < f64::EPSILON);
        assert!((bounds.z_min() - 0.5).abs() < f64::EPSILON);
        assert!((bounds.z_max() - 1.2).abs() < f64::EPSILON);
        assert!(bounds.validate().is_ok());
    }

    // Tests the patch centre and ranges
    // Verified by using ra_max alone as the centre
    #[test]
    fn test_center_and_ranges() {
        let bounds = Boundaries::new(10.0, 14.0, -2.0, 2.0, 0.0, 1.0);

        assert_eq!(bounds.center(), (12.0, 0.0));
        assert!((bounds.ra_range() - 4.0).abs() < f64::EPSILON);
        assert!((bounds.dec_range() - 4.0).abs() < f64::EPSILON);
    }

    // Tests empty or inverted axes are rejected
    // Verified by skipping the redshift axis check
    #[test]
    fn test_validate_rejects_empty_axes() {
        let cases = [
            Boundaries::new(10.0, 10.0, 0.0, 1.0, 0.0, 1.0),
            Boundaries::new(10.0, 11.0, 2.0, 1.0, 0.0, 1.0),
            Boundaries::new(10.0, 11.0, 0.0, 1.0, 1.0, 1.0),
            Boundaries::new(f64::NAN, 11.0, 0.0, 1.0, 0.0, 1.0),
        ];
        for bounds in cases {
            assert!(
                matches!(bounds.validate(), Err(MappingError::InvalidBounds { .. })),
                "{bounds:?} should be rejected"
            );
        }
    }

    // Tests patches outside the celestial sphere are rejected
    // Verified by removing the declination range check
    #[test]
    fn test_validate_rejects_off_sky_ranges() {
        let ra_outside = Boundaries::new(350.0, 361.0, 0.0, 1.0, 0.0, 1.0);
        let dec_outside = Boundaries::new(10.0, 11.0, -91.0, -80.0, 0.0, 1.0);

        assert!(ra_outside.validate().is_err());
        assert!(dec_outside.validate().is_err());
        assert!(Boundaries::default().validate().is_err());
    }
}
