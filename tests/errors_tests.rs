use localdrop::errors::{LocalDropError, Result};
use localdrop::transfer::protocol::ProtocolError;
use std::error::Error;

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = LocalDropError::config("bad port");

        assert!(matches!(error, LocalDropError::Config(_)));
        assert!(error.to_string().contains("Configuration Error"));
        assert!(error.to_string().contains("bad port"));
    }

    #[test]
    fn test_transfer_denied_error() {
        let error = LocalDropError::transfer_denied("Desk said no");

        assert!(matches!(error, LocalDropError::TransferDenied(_)));
        assert_eq!(error.code(), "E008");
        assert_eq!(error.message(), "Desk said no");
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            LocalDropError::config(""),
            LocalDropError::network(""),
            LocalDropError::protocol(""),
            LocalDropError::file_operation(""),
            LocalDropError::validation(""),
            LocalDropError::not_found(""),
            LocalDropError::serialization(""),
            LocalDropError::transfer_denied(""),
            LocalDropError::transfer_failed(""),
            LocalDropError::discovery(""),
            LocalDropError::timeout(""),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_format_colored_contains_code() {
        colored::control::set_override(false);
        let formatted = LocalDropError::timeout("no answer").format_colored();
        assert!(formatted.contains("E011"));
        assert!(formatted.contains("no answer"));
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_io_not_found_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let error: LocalDropError = io_error.into();

        assert!(matches!(error, LocalDropError::NotFound(_)));
        assert!(error.to_string().contains("missing.txt"));
    }

    #[test]
    fn test_io_connection_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error: LocalDropError = io_error.into();

        assert!(matches!(error, LocalDropError::Network(_)));
    }

    #[test]
    fn test_io_other_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: LocalDropError = io_error.into();

        assert!(matches!(error, LocalDropError::FileOperation(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json").unwrap_err();
        let error: LocalDropError = json_error.into();

        assert!(matches!(error, LocalDropError::Serialization(_)));
    }

    #[test]
    fn test_protocol_error_conversion() {
        let error: LocalDropError = ProtocolError::MessageTooLarge(10).into();
        assert!(matches!(error, LocalDropError::Protocol(_)));

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let error: LocalDropError = ProtocolError::Io(io).into();
        assert!(matches!(error, LocalDropError::Network(_)));
    }
}

#[cfg(test)]
mod error_trait_tests {
    use super::*;

    #[test]
    fn test_error_trait_implementation() {
        let error = LocalDropError::validation("bad name");

        let error_trait: &dyn Error = &error;
        assert!(!error_trait.to_string().is_empty());
        assert!(error_trait.source().is_none());
    }

    #[test]
    fn test_send_sync_traits() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LocalDropError>();
        assert_sync::<LocalDropError>();
    }

    #[test]
    fn test_result_and_then() {
        let result: Result<u16> = Ok(0);
        let chained = result.and_then(|port| {
            if port == 0 {
                Err(LocalDropError::validation("Port must not be 0"))
            } else {
                Ok(port)
            }
        });

        assert!(matches!(chained, Err(LocalDropError::Validation(_))));
    }
}
