//! Cutting the lattice mesh with planar surfaces, with one offset retry.
//!
//! Boolean cuts against surfaces that coincide with the mesh's own faces
//! are numerically fragile. A cut that keeps less than a small fraction of
//! the bounding volume is treated as failed and redone with every surface
//! moved a short distance along its normal.

use mesh_boolean::{BooleanConfig, difference_with_sheets};
use mesh_repair::{CUT_REPORT, MeshReport, fill_holes, keys, validate_mesh};
use mesh_types::{IndexedMesh, MeshBounds, Point3, Vector3};
use tracing::{debug, info, warn};

use crate::build::incomplete_repair;
use crate::error::{LatticeError, LatticeResult, PipelineWarning};

/// A planar rectangle used as a cutter.
///
/// The side the normal points into is kept; material behind the surface is
/// removed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CutSurface {
    /// Center of the rectangle.
    pub center: Point3<f64>,
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Unit in-plane direction of the first half extent.
    pub u_axis: Vector3<f64>,
    /// Half extents along `u_axis` and `normal × u_axis`.
    pub half_extents: [f64; 2],
}

impl CutSurface {
    /// Create a rectangle centered on `center`.
    ///
    /// `u_axis` is projected into the plane and normalized.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvalidCutSurface`] if the normal is zero,
    /// `u_axis` is parallel to it, or an extent is not positive.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_lattice::CutSurface;
    /// use mesh_types::{Point3, Vector3};
    ///
    /// let top = CutSurface::new(
    ///     Point3::new(0.0, 0.0, 10.0),
    ///     -Vector3::z(),
    ///     Vector3::x(),
    ///     [6.0, 6.0],
    /// )
    /// .unwrap();
    /// assert_eq!(top.to_mesh().face_count(), 2);
    /// ```
    pub fn new(
        center: Point3<f64>,
        normal: Vector3<f64>,
        u_axis: Vector3<f64>,
        half_extents: [f64; 2],
    ) -> LatticeResult<Self> {
        let invalid = |reason: &str| LatticeError::InvalidCutSurface {
            reason: reason.to_string(),
        };
        let normal = normal
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| invalid("zero normal"))?;
        let u_axis = (u_axis - normal * u_axis.dot(&normal))
            .try_normalize(1e-12)
            .ok_or_else(|| invalid("in-plane axis is parallel to the normal"))?;
        if !half_extents.iter().all(|e| *e > 0.0 && e.is_finite()) {
            return Err(invalid("extents must be positive"));
        }
        Ok(Self {
            center,
            normal,
            u_axis,
            half_extents,
        })
    }

    /// Second in-plane direction, completing a right-handed frame with the normal.
    #[must_use]
    pub fn v_axis(&self) -> Vector3<f64> {
        self.normal.cross(&self.u_axis)
    }

    /// The same rectangle moved `distance` along its normal.
    #[must_use]
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            center: self.center + self.normal * distance,
            ..*self
        }
    }

    /// Two triangles wound so their normal is the surface normal.
    #[must_use]
    pub fn to_mesh(&self) -> IndexedMesh {
        let u = self.u_axis * self.half_extents[0];
        let v = self.v_axis() * self.half_extents[1];
        let c = self.center;
        IndexedMesh::from_positions(&[c - u - v, c + u - v, c + u + v, c - u + v], &[[0, 1, 2], [0, 2, 3]])
    }
}

/// Settings for [`cut_with_retry`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CutParams {
    /// Kept bounding volume fraction below which a cut counts as failed.
    ///
    /// Default: `0.01`
    pub degeneracy_ratio: f64,
    /// Distance surfaces move along their normals for the retry.
    ///
    /// Default: `0.01`
    pub retry_offset: f64,
    /// Largest hole, in edges, that filling will cap.
    ///
    /// Default: `100_000`
    pub max_hole_edges: usize,
    /// Boolean settings.
    pub boolean: BooleanConfig,
}

impl Default for CutParams {
    fn default() -> Self {
        Self {
            degeneracy_ratio: 0.01,
            retry_offset: 0.01,
            max_hole_edges: 100_000,
            boolean: BooleanConfig::default(),
        }
    }
}

impl CutParams {
    /// Set the degeneracy threshold.
    #[must_use]
    pub const fn with_degeneracy_ratio(mut self, ratio: f64) -> Self {
        self.degeneracy_ratio = ratio;
        self
    }

    /// Set the retry offset.
    #[must_use]
    pub const fn with_retry_offset(mut self, offset: f64) -> Self {
        self.retry_offset = offset;
        self
    }

    /// Set the hole size limit.
    #[must_use]
    pub const fn with_max_hole_edges(mut self, edges: usize) -> Self {
        self.max_hole_edges = edges;
        self
    }

    /// Set the boolean settings.
    #[must_use]
    pub const fn with_boolean(mut self, boolean: BooleanConfig) -> Self {
        self.boolean = boolean;
        self
    }
}

/// Result of [`cut_with_retry`].
#[derive(Debug, Clone)]
pub struct CutOutcome {
    /// The cut and filled mesh.
    pub mesh: IndexedMesh,
    /// Report carrying the cut counters.
    pub report: MeshReport,
    /// Whether the offset retry ran.
    pub revised: bool,
    /// Kept bounding volume fraction of the cut that was used.
    pub ratio: f64,
    /// Problems that were recovered from or left in place.
    pub warnings: Vec<PipelineWarning>,
}

/// One boolean attempt: the cut mesh and its kept bounding volume fraction.
fn attempt(
    mesh: &IndexedMesh,
    surfaces: &[CutSurface],
    offset: f64,
    config: &BooleanConfig,
) -> LatticeResult<(IndexedMesh, f64)> {
    let sheets: Vec<IndexedMesh> = surfaces.iter().map(|s| s.offset(offset).to_mesh()).collect();
    let cut = difference_with_sheets(mesh, &sheets, config)?;
    let before = mesh.bounds().volume();
    let ratio = if before > 0.0 {
        cut.bounds().volume() / before
    } else {
        1.0
    };
    Ok((cut, ratio))
}

/// Cut `mesh` by `surfaces`, retrying once with offset surfaces if the cut
/// degenerates, then fill the holes the cut opened.
///
/// A boolean that fails outright counts as a degenerate cut. The report
/// carries `revised_cut`, `face_count_cut`, `fill_success` and
/// `face_count_filled`, and is produced whatever happens: if the retry
/// also degenerates, its result (or the uncut mesh, when the boolean
/// itself failed) goes on to filling and a warning is attached.
#[must_use]
pub fn cut_with_retry(mesh: &IndexedMesh, surfaces: &[CutSurface], params: &CutParams) -> CutOutcome {
    let threshold = params.degeneracy_ratio;
    let mut warnings = Vec::new();

    let first = attempt(mesh, surfaces, 0.0, &params.boolean);
    let revised = !first.as_ref().is_ok_and(|(_, ratio)| *ratio >= threshold);
    let result = if revised {
        let reason = match &first {
            Ok((_, ratio)) => LatticeError::BooleanDegeneracy { ratio: *ratio, threshold }.to_string(),
            Err(error) => error.to_string(),
        };
        warn!(%reason, offset = params.retry_offset, "retrying cut with offset surfaces");
        attempt(mesh, surfaces, params.retry_offset, &params.boolean)
    } else {
        first
    };

    let (mut cut, ratio) = match result {
        Ok(done) => done,
        Err(error) => {
            debug!(%error, "cut failed, keeping uncut mesh");
            (mesh.clone(), 0.0)
        }
    };
    if ratio < threshold {
        warn!(ratio, threshold, "cut still degenerate after retry");
        warnings.push(PipelineWarning::BooleanDegeneracy { ratio, threshold });
    }

    let face_count_cut = cut.face_count();
    let fill_success = match fill_holes(&mut cut, params.max_hole_edges) {
        Ok(outcome) => outcome.is_complete(),
        Err(error) => {
            debug!(%error, "hole filling failed");
            false
        }
    };
    let face_count_filled = cut.face_count();

    let report = validate_mesh(CUT_REPORT, &cut)
        .with_extra(keys::REVISED_CUT, revised)
        .with_extra(keys::FACE_COUNT_CUT, face_count_cut)
        .with_extra(keys::FILL_SUCCESS, fill_success)
        .with_extra(keys::FACE_COUNT_FILLED, face_count_filled);

    if !report.closed_mesh {
        warn!(naked_edges = report.naked_edges, "cut mesh is still open");
        warnings.push(PipelineWarning::HoleFillFailure {
            face_count_cut,
            face_count_filled,
            naked_edges: report.naked_edges,
        });
    }
    warnings.extend(incomplete_repair(&report));

    info!(
        revised,
        ratio,
        face_count_cut,
        face_count_filled,
        closed = report.closed_mesh,
        "cut lattice mesh"
    );
    CutOutcome {
        mesh: cut,
        report,
        revised,
        ratio,
        warnings,
    }
}
