//! Errors and non-fatal warnings for lattice generation.

use mesh_boolean::BooleanError;
use mesh_from_curves::CurveError;
use mesh_repair::RepairError;
use mesh_sdf::SdfError;
use thiserror::Error;

/// Result type for lattice operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Errors that can occur during lattice generation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LatticeError {
    /// A mapping source box has zero extent on some axis.
    #[error("degenerate source bounds: min {min:?}, max {max:?}")]
    DegenerateBounds {
        /// Minimum corner.
        min: [f64; 3],
        /// Maximum corner.
        max: [f64; 3],
    },

    /// A destination voxel is empty or not finite.
    #[error("invalid voxel: min {min:?}, max {max:?}")]
    InvalidVoxel {
        /// Minimum corner.
        min: [f64; 3],
        /// Maximum corner.
        max: [f64; 3],
    },

    /// A cut degenerated: the bounding-box volume kept is below the threshold.
    #[error("boolean cut kept {ratio:.4} of the bounding volume (threshold {threshold})")]
    BooleanDegeneracy {
        /// Cut bounding-box volume over the uncut one.
        ratio: f64,
        /// Ratio below which the cut counts as failed.
        threshold: f64,
    },

    /// The primitive has no faces.
    #[error("primitive mesh is empty")]
    EmptyPrimitive,

    /// The primitive could not be turned into a closed boundary.
    #[error("primitive preparation failed: {reason}")]
    PrimitivePreparation {
        /// What went wrong.
        reason: String,
    },

    /// The unit cell has no curves.
    #[error("unit cell has no curves")]
    EmptyUnitCell,

    /// Strut radius is not positive and finite.
    #[error("radius must be positive, got {0}")]
    InvalidRadius(f64),

    /// A cut surface has no usable normal or extent.
    #[error("invalid cut surface: {reason}")]
    InvalidCutSurface {
        /// What was wrong with it.
        reason: String,
    },

    /// Thickening failed.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// A boolean operation failed.
    #[error(transparent)]
    Boolean(#[from] BooleanError),

    /// A repair pass failed.
    #[error(transparent)]
    Repair(#[from] RepairError),

    /// The boundary could not be prepared for containment queries.
    #[error(transparent)]
    Sdf(#[from] SdfError),
}

impl LatticeError {
    pub(crate) fn degenerate_bounds(bounds: &mesh_types::Aabb) -> Self {
        Self::DegenerateBounds {
            min: bounds.min.coords.into(),
            max: bounds.max.coords.into(),
        }
    }
}

/// A recovered problem attached to a result instead of aborting it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipelineWarning {
    /// Boundary crossings of one curve produced repeated split parameters,
    /// which were collapsed.
    IntersectionAmbiguity {
        /// Index of the curve in the trimmed batch.
        curve: usize,
        /// Number of parameters dropped as duplicates.
        duplicates: usize,
    },

    /// Both the first cut and the offset retry degenerated.
    BooleanDegeneracy {
        /// Ratio of the retried cut.
        ratio: f64,
        /// Ratio below which a cut counts as failed.
        threshold: f64,
    },

    /// The mesh is still invalid after a repair stage.
    MeshRepairIncomplete {
        /// Report version of the stage.
        stage: String,
        /// Validation log of the mesh.
        log: String,
    },

    /// Hole filling after the cut left the mesh open.
    HoleFillFailure {
        /// Faces right after the cut.
        face_count_cut: usize,
        /// Faces after filling.
        face_count_filled: usize,
        /// Naked edges remaining.
        naked_edges: usize,
    },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IntersectionAmbiguity { curve, duplicates } => {
                write!(f, "curve {curve}: collapsed {duplicates} duplicate crossings")
            }
            Self::BooleanDegeneracy { ratio, threshold } => {
                write!(f, "cut degenerated after retry (ratio {ratio:.4} < {threshold})")
            }
            Self::MeshRepairIncomplete { stage, log } => {
                write!(f, "{stage}: mesh still invalid: {log}")
            }
            Self::HoleFillFailure {
                face_count_cut,
                face_count_filled,
                naked_edges,
            } => write!(
                f,
                "hole filling left {naked_edges} naked edges ({face_count_cut} -> {face_count_filled} faces)"
            ),
        }
    }
}

/// A voxel whose population failed; siblings are unaffected.
#[derive(Debug)]
pub struct VoxelError {
    /// Position of the voxel in the input list.
    pub index: usize,
    /// Why it failed.
    pub error: LatticeError,
}

impl std::fmt::Display for VoxelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "voxel {}: {}", self.index, self.error)
    }
}
