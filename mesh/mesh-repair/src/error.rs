//! Error types for mesh repair operations.

use thiserror::Error;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh repair.
#[derive(Debug, Error)]
pub enum RepairError {
    /// Mesh is empty (no vertices or faces).
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face refers to a vertex that does not exist.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex {
        /// The invalid index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// One or more boundary loops could not be capped.
    #[error("failed to fill holes: {reason}")]
    HoleFillFailed {
        /// Reason for failure.
        reason: String,
    },
}

impl RepairError {
    /// First out-of-range index in `faces`, as an error.
    pub(crate) fn check_indices<F: AsRef<[u32]>>(
        faces: &[F],
        vertex_count: usize,
    ) -> RepairResult<()> {
        match faces
            .iter()
            .flat_map(|f| f.as_ref().iter().copied())
            .find(|&i| i as usize >= vertex_count)
        {
            Some(index) => Err(Self::InvalidIndex {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}
