//! Error types for mesh validation.

use thiserror::Error;

/// A mesh buffer that breaks the geometry invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("expected {expected} position components for {vertices} vertices, found {actual}")]
    PositionLength {
        vertices: usize,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} indices for {triangles} triangles, found {actual}")]
    TriangleLength {
        triangles: usize,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} at slot {slot} is out of range for {vertices} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertices: usize,
    },

    #[error("expected {expected} normal components, found {actual}")]
    NormalLength { expected: usize, actual: usize },

    #[error("expected {expected} color components, found {actual}")]
    ColorLength { expected: usize, actual: usize },
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
