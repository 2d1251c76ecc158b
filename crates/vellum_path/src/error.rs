//! Path error types

use thiserror::Error;

/// Errors raised by path operations
///
/// Boolean operations never fail; ambiguous geometry yields fewer or empty
/// contours instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// Interpolation operands differ in contour or segment counts
    #[error("Invalid operands in interpolate: {from} does not match {to}")]
    InterpolationMismatch { from: String, to: String },

    /// Malformed SVG path data
    #[error("Invalid path data at {position}: {message}")]
    Parse { position: usize, message: String },
}

/// Result type for path operations
pub type Result<T> = std::result::Result<T, PathError>;
