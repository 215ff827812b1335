//! Error types for moodle2edx operations.

use thiserror::Error;

/// Errors that can occur while reading a backup or writing a course.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Missing {kind} with id {id}")]
    MissingResource { kind: &'static str, id: String },

    #[error("Document already written: {0}")]
    DuplicateDocument(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    pub(crate) fn missing(kind: &'static str, id: impl Into<String>) -> Self {
        Error::MissingResource {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
