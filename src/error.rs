//! Error types for unmark library.

use std::io;
use thiserror::Error;

/// Result type alias for unmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction, segmentation and writing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing the JSON intermediate form.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No filter is registered under the given configuration id.
    #[error("Unknown filter configuration: {0}")]
    UnknownFormat(String),

    /// A parameter or argument has an invalid value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A coded-text position or range is out of bounds or splits a code marker.
    #[error("Invalid range {start}..{end} for coded text of length {len}")]
    InvalidRange {
        /// Start of the requested range
        start: usize,
        /// End of the requested range
        end: usize,
        /// Length of the coded text
        len: usize,
    },

    /// Coded text does not follow the marker scheme.
    #[error("Invalid coded text at position {position}: {reason}")]
    InvalidCodedText {
        /// Character position of the problem
        position: usize,
        /// Description of the problem
        reason: String,
    },

    /// A fragment cannot hold more inline codes.
    #[error("Too many inline codes (maximum is {0})")]
    TooManyCodes(usize),

    /// A skeleton references a resource that was never produced.
    #[error("Unresolved reference '{reference}' in resource '{resource_id}'")]
    UnresolvedReference {
        /// Resource holding the skeleton
        resource_id: String,
        /// The missing referent id
        reference: String,
    },

    /// A skeleton references a segment id that does not exist in its text unit.
    #[error("Segment '{segment_id}' not found in text unit '{resource_id}'")]
    OrphanedSegment {
        /// Text unit holding the skeleton
        resource_id: String,
        /// The missing segment id
        segment_id: String,
    },

    /// A content or segment reference appears in a resource that has no content.
    #[error("Self reference in resource '{0}' which is not a text unit")]
    InvalidSelfReference(String),

    /// A segment marked as not re-segmentable was part of a join.
    #[error("Part {0} cannot be re-segmented")]
    NotResegmentable(usize),

    /// Malformed `annotatorsRef` value.
    #[error("Invalid annotatorsRef value: {0}")]
    InvalidAnnotatorsRef(String),

    /// Input could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Id of the resource the error is attached to, if any.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Error::UnresolvedReference { resource_id, .. }
            | Error::OrphanedSegment { resource_id, .. } => Some(resource_id),
            Error::InvalidSelfReference(id) => Some(id),
            _ => None,
        }
    }

    /// Check if this error invalidates the whole document being processed.
    pub fn is_fatal_for_document(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedReference { .. }
                | Error::OrphanedSegment { .. }
                | Error::InvalidSelfReference(_)
                | Error::Io(_)
                | Error::Encoding(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat("okf_foo".to_string());
        assert_eq!(err.to_string(), "Unknown filter configuration: okf_foo");

        let err = Error::OrphanedSegment {
            resource_id: "tu1".to_string(),
            segment_id: "s9".to_string(),
        };
        assert_eq!(err.to_string(), "Segment 's9' not found in text unit 'tu1'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_resource_id() {
        let err = Error::UnresolvedReference {
            resource_id: "dp3".to_string(),
            reference: "tu7".to_string(),
        };
        assert_eq!(err.resource_id(), Some("dp3"));
        assert!(err.is_fatal_for_document());
        assert!(Error::InvalidParameter("x".into()).resource_id().is_none());
        assert!(!Error::InvalidParameter("x".into()).is_fatal_for_document());
    }
}
