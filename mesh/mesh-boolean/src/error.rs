//! Error types for boolean operations.

use thiserror::Error;

/// Errors that can occur during boolean operations.
#[derive(Debug, Error)]
pub enum BooleanError {
    /// The mesh being cut has no faces.
    #[error("empty mesh: {details}")]
    EmptyMesh {
        /// Description of which mesh is empty.
        details: String,
    },

    /// A cutter has no usable plane (zero area or no faces).
    #[error("degenerate cutter {cutter}: {details}")]
    DegenerateCutter {
        /// Index of the cutter.
        cutter: usize,
        /// Description of the degeneracy.
        details: String,
    },

    /// Faces of the mesh lie in the plane of a cutter, so the side to keep
    /// is ambiguous.
    #[error("{count} faces are coplanar with cutter {cutter}")]
    CoplanarFaces {
        /// Index of the cutter.
        cutter: usize,
        /// Number of mesh faces in the cutter plane.
        count: usize,
    },

    /// A face refers to a vertex that does not exist.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex {
        /// The invalid index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Result type for boolean operations.
pub type BooleanResult<T> = Result<T, BooleanError>;
