use std::path::PathBuf;

use thiserror::Error;

/// Failure to decode a route document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid UTF-8 in document")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("undefined entity '&{name};'")]
    UnknownEntity { name: String },

    #[error("document has no root element")]
    MissingRoot,

    #[error("expected root element <gpx>, found <{found}>")]
    UnexpectedRoot { found: String },

    #[error("unexpected end of document inside <{element}>")]
    UnexpectedEof { element: &'static str },

    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("value {value} for attribute '{attribute}' is outside [-{limit}, {limit}]")]
    OutOfRange {
        attribute: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Run-level error. Every variant aborts the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read route file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse route file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid identity file {}", .path.display())]
    IdentityFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
