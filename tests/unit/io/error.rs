//! Tests for error formatting and source chaining

#[cfg(test)]
mod tests {
    use massmap::MappingError;
    use massmap::io::error::{computation_error, dimension_mismatch, invalid_parameter};
    use std::error::Error;

    // Tests file system errors expose their I/O source
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let error = MappingError::FileSystem {
            path: "/tmp/map.fits".into(),
            operation: "create directory",
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(error.source().is_some());
        let message = error.to_string();
        assert!(message.contains("/tmp/map.fits"));
        assert!(message.contains("create directory"));
        assert!(message.contains("denied"));
    }

    // Tests dimension mismatches print both shapes
    // Verified by omitting the found shape from the message
    #[test]
    fn test_dimension_mismatch_message() {
        let error = dimension_mismatch("inpainting", (64, 64, 2), (64, 32, 2));

        let message = error.to_string();
        assert!(message.contains("inpainting"));
        assert!(message.contains("64x64x2"));
        assert!(message.contains("64x32x2"));
        assert!(error.source().is_none());
    }

    // Tests InvalidParameter error contains all fields
    // Verified by omitting value from message
    #[test]
    fn test_invalid_parameter_error() {
        let error = invalid_parameter("block_size", &"3x4", &"must divide the plane");

        let message = error.to_string();
        assert!(message.contains("block_size"));
        assert!(message.contains("3x4"));
        assert!(message.contains("must divide the plane"));
    }

    // Tests preview export errors carry the image error
    // Verified by excluding source error from message
    #[test]
    fn test_preview_export_error() {
        let error = MappingError::PreviewExport {
            path: "/restricted/kappa.png".into(),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "access denied",
            )),
        };

        let message = error.to_string();
        assert!(message.contains("/restricted/kappa.png"));
        assert!(message.contains("access denied"));
        assert!(error.source().is_some());
    }

    // Tests the message-only variants
    // Verified by swapping variant prefixes
    #[test]
    fn test_message_only_variants() {
        let bounds = MappingError::InvalidBounds {
            reason: "ra_min must be below ra_max".to_string(),
        };
        assert!(bounds.to_string().starts_with("Invalid boundaries"));

        let missing = MappingError::MissingInput {
            what: "density map",
        };
        assert_eq!(missing.to_string(), "Missing input: density map");

        let computation = computation_error("inpainting", &"non-finite values");
        assert_eq!(
            computation.to_string(),
            "Computation error in inpainting: non-finite values"
        );
    }
}
