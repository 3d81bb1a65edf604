//! Error types for unquote library.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for unquote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading documents or resolving pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a Word package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The zip container could not be read or written.
    #[error("Archive error: {0}")]
    Archive(String),

    /// The package XML is malformed.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The external automation process failed.
    #[error("Automation error: {0}")]
    Automation(String),

    /// The external automation process exceeded its allowance.
    #[error("Automation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart(err.to_string()),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(
            err.to_string(),
            "Unknown file format: not a valid DOCX package"
        );

        let err = Error::Timeout(Duration::from_secs(90));
        assert_eq!(err.to_string(), "Automation timed out after 90s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_missing_file_conversion() {
        let err: Error = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, Error::MissingPart(_)));
    }
}
