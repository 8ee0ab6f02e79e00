//! Clipping curves to the inside of a closed boundary mesh.

use mesh_boolean::{Bvh, intersect_polyline_mesh};
use mesh_sdf::SignedDistanceField;
use mesh_types::{IndexedMesh, Polyline};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{LatticeError, LatticeResult, PipelineWarning};

/// Settings for [`trim_curve`] and [`trim_all`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrimParams {
    /// A piece is kept when its midpoint is inside the boundary and farther
    /// than this from its surface.
    ///
    /// Default: `1e-3`
    pub containment_tolerance: f64,
    /// Split parameters closer than this collapse into one.
    ///
    /// Default: `1e-9`
    pub parameter_tolerance: f64,
    /// Trim curves on the rayon pool.
    ///
    /// Default: `true`
    pub parallel: bool,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            containment_tolerance: 1e-3,
            parameter_tolerance: 1e-9,
            parallel: true,
        }
    }
}

impl TrimParams {
    /// Set the containment tolerance.
    #[must_use]
    pub const fn with_containment_tolerance(mut self, tolerance: f64) -> Self {
        self.containment_tolerance = tolerance;
        self
    }

    /// Set the split parameter tolerance.
    #[must_use]
    pub const fn with_parameter_tolerance(mut self, tolerance: f64) -> Self {
        self.parameter_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel trimming.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A boundary mesh prepared for crossing and containment queries.
///
/// Build once per batch and share by reference across workers.
#[derive(Debug)]
pub struct TrimBoundary<'a> {
    mesh: &'a IndexedMesh,
    bvh: Bvh,
    field: SignedDistanceField,
}

impl<'a> TrimBoundary<'a> {
    /// Prepare `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::EmptyPrimitive`] for a mesh without faces
    /// and [`LatticeError::Sdf`] for one with bad indices.
    pub fn new(mesh: &'a IndexedMesh) -> LatticeResult<Self> {
        if mesh.is_empty() {
            return Err(LatticeError::EmptyPrimitive);
        }
        let field = SignedDistanceField::from_mesh(mesh)?;
        let bvh = Bvh::build(mesh, 8, true);
        Ok(Self { mesh, bvh, field })
    }

    /// The boundary mesh.
    #[must_use]
    pub const fn mesh(&self) -> &IndexedMesh {
        self.mesh
    }

    /// Containment with the surface band excluded.
    #[must_use]
    pub fn contains(&self, point: mesh_types::Point3<f64>, tolerance: f64) -> bool {
        self.field.is_strictly_inside(point, tolerance)
    }
}

/// Pieces of one curve that lie inside the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrimmedCurves {
    /// Kept pieces, in order along the curve.
    pub pieces: Vec<Polyline>,
    /// Crossing parameters dropped as duplicates of another.
    pub duplicates: usize,
}

/// Keep the parts of `curve` inside `boundary`.
///
/// The curve is split at every crossing with the boundary surface; each
/// piece is kept when the point at its middle parameter is inside. With no
/// crossings the whole curve is kept or dropped by its own midpoint.
///
/// # Example
///
/// ```
/// use mesh_lattice::{trim_curve, TrimBoundary, TrimParams};
/// use mesh_types::{unit_cube, Point3, Polyline};
///
/// let cube = unit_cube();
/// let boundary = TrimBoundary::new(&cube).unwrap();
/// let through = Polyline::from_segment(Point3::new(-1.0, 0.5, 0.5), Point3::new(2.0, 0.5, 0.5));
///
/// let trimmed = trim_curve(&through, &boundary, &TrimParams::default());
/// assert_eq!(trimmed.pieces.len(), 1);
/// assert!((trimmed.pieces[0].length() - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn trim_curve(curve: &Polyline, boundary: &TrimBoundary<'_>, params: &TrimParams) -> TrimmedCurves {
    if curve.is_empty() {
        return TrimmedCurves::default();
    }
    let tol = params.containment_tolerance;
    let hits = intersect_polyline_mesh(curve, boundary.mesh, &boundary.bvh, params.parameter_tolerance);

    if hits.is_empty() {
        let keep = curve.midpoint().is_some_and(|m| boundary.contains(m, tol));
        return TrimmedCurves {
            pieces: if keep { vec![curve.clone()] } else { Vec::new() },
            duplicates: 0,
        };
    }

    // closest parameter of each crossing point, sorted and collapsed
    let mut params_on_curve: Vec<f64> = hits
        .iter()
        .filter_map(|h| curve.closest_parameter(&h.point))
        .collect();
    params_on_curve.sort_by(f64::total_cmp);
    let before = params_on_curve.len();
    params_on_curve.dedup_by(|b, a| (*b - *a).abs() <= params.parameter_tolerance);
    let duplicates = before - params_on_curve.len();

    let pieces = curve
        .split_spans(&params_on_curve, params.parameter_tolerance)
        .into_iter()
        .filter(|&(t0, t1)| {
            curve
                .point_at_wrapped(0.5 * (t0 + t1))
                .is_some_and(|m| boundary.contains(m, tol))
        })
        .map(|(t0, t1)| curve.sub_curve(t0, t1))
        .collect();

    TrimmedCurves { pieces, duplicates }
}

/// Trimmed pieces of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct TrimOutput {
    /// Every kept piece; order follows the input curves.
    pub curves: Vec<Polyline>,
    /// Curves whose crossings had to be collapsed.
    pub warnings: Vec<PipelineWarning>,
}

/// Trim every curve in `curves` against `boundary`.
///
/// Curves are trimmed independently, each returning its own pieces, which
/// are concatenated afterwards.
#[must_use]
pub fn trim_all(curves: &[Polyline], boundary: &TrimBoundary<'_>, params: &TrimParams) -> TrimOutput {
    let per_curve: Vec<TrimmedCurves> = if params.parallel {
        curves.par_iter().map(|c| trim_curve(c, boundary, params)).collect()
    } else {
        curves.iter().map(|c| trim_curve(c, boundary, params)).collect()
    };

    let mut out = TrimOutput::default();
    for (curve, trimmed) in per_curve.into_iter().enumerate() {
        if trimmed.duplicates > 0 {
            debug!(curve, duplicates = trimmed.duplicates, "collapsed duplicate crossings");
            out.warnings.push(PipelineWarning::IntersectionAmbiguity {
                curve,
                duplicates: trimmed.duplicates,
            });
        }
        out.curves.extend(trimmed.pieces);
    }
    info!(input = curves.len(), kept = out.curves.len(), "trimmed lattice curves");
    out
}
