//! Error types for loading and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors produced while decoding STL data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StlError {
    /// Binary data shorter than the 80-byte header plus triangle count.
    #[error("ParseError: file too small ({len} bytes, need at least 84)")]
    TooSmall {
        /// Number of bytes available.
        len: usize,
    },

    /// Parsing succeeded but produced no triangles.
    #[error("ParseError: empty mesh")]
    EmptyMesh,

    /// More triangles than the binary count field can hold.
    #[error("EncodeError: {count} triangles exceed the binary STL limit")]
    TooManyTriangles {
        /// Number of triangles requested.
        count: usize,
    },

    /// An ASCII `vertex` line without exactly three numbers.
    #[error("ParseError: malformed vertex on line {line}")]
    MalformedVertex {
        /// 1-based line number.
        line: usize,
    },
}

/// Errors that abort a render invocation.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The input could not be decoded as STL.
    #[error(transparent)]
    Stl(#[from] StlError),

    /// Reading the input or preparing the output location failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or created.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// PNG encoding or writing failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A render option is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
