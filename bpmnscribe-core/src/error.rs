//! Error types for the extractor and the template transformer.
//!
//! Only malformed top-level input is an error. Missing geometry and dangling
//! references are not errors; they are recorded as [`crate::types::Diagnostic`]
//! values on the transcript.

use thiserror::Error;

/// Input bytes could not be read as a well-formed XML document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed XML at byte {position}: {message}")]
    Structure { position: usize, message: String },
}

impl ParseError {
    pub(crate) fn structure(position: usize, message: impl Into<String>) -> Self {
        ParseError::Structure {
            position,
            message: message.into(),
        }
    }
}

/// Failures of the Word/Excel template transformer.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unsupported file format '{0}': use .docx or .xlsx")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed part '{part}': {source}")]
    Part {
        part: String,
        #[source]
        source: ParseError,
    },

    #[error("missing package part '{0}'")]
    MissingPart(String),

    #[error("worksheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("image '{0}' is not a PNG, JPEG or GIF")]
    UnsupportedImage(String),
}
