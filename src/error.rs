// World loading errors: configuration documents and legacy binary imports

use thiserror::Error;

/// Errors raised while building a world from external input.
///
/// These are format-level failures: they abort the load and leave the target
/// world untouched.
#[derive(Error, Debug)]
pub enum WorldError {
    #[error("{what} too short: expected at least {expected} words, got {actual}")]
    TooShort {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid magic signature")]
    BadMagic,
    #[error("{what} truncated: header announces {expected} words, only {actual} present")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("odd byte length {0} for a 16-bit word buffer")]
    OddLength(usize),
    #[error("invalid wall segment ({x1}, {y1}) - ({x2:?}, {y2:?})")]
    InvalidWall {
        x1: u32,
        y1: u32,
        x2: Option<u32>,
        y2: Option<u32>,
    },
    #[error("invalid world dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("coordinate ({x}, {y}) outside the world")]
    InvalidCoordinate { x: i64, y: i64 },
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: u32 },
    #[error("malformed world document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
