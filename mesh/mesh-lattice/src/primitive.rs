//! Turning the input solid into a clean closed boundary.

use mesh_boolean::{BooleanConfig, CoplanarStrategy, difference_with_sheets};
use mesh_repair::{
    fill_holes, heal_naked_edges, orient_triangles_outward, remove_unreferenced_vertices,
    unify_triangle_normals, validate_mesh, weld_vertices,
};
use mesh_types::{Aabb, IndexedMesh, MeshBounds, Vector3};
use tracing::{debug, info, warn};

use crate::cut::CutSurface;
use crate::error::{LatticeError, LatticeResult};
use crate::map::DEGENERATE_EXTENT;

/// Input geometry for the primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawGeometry {
    /// An already tessellated solid.
    Mesh(IndexedMesh),
    /// Separately tessellated surface patches of a solid; their shared
    /// edges are healed together.
    Patches(Vec<IndexedMesh>),
}

impl From<IndexedMesh> for RawGeometry {
    fn from(mesh: IndexedMesh) -> Self {
        Self::Mesh(mesh)
    }
}

/// Settings for [`prepare_primitive`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimitiveParams {
    /// Naked-edge vertices of patches closer than this are joined.
    ///
    /// Default: `0.01`
    pub heal_distance: f64,
    /// Coincident vertices closer than this are welded.
    ///
    /// Default: `1e-6`
    pub weld_distance: f64,
    /// Scale of the cut surfaces relative to the primitive's extents.
    ///
    /// Default: `1.2`
    pub margin: f64,
    /// Largest hole, in edges, capped on the octant.
    ///
    /// Default: `100_000`
    pub max_hole_edges: usize,
    /// Boolean settings for the octant.
    ///
    /// Default: coplanar faces sorted by orientation, so faces lying in a
    /// symmetry plane stay on the octant when they bound it.
    pub boolean: BooleanConfig,
}

impl Default for PrimitiveParams {
    fn default() -> Self {
        Self {
            heal_distance: 0.01,
            weld_distance: 1e-6,
            margin: 1.2,
            max_hole_edges: 100_000,
            boolean: BooleanConfig::default()
                .with_coplanar_strategy(CoplanarStrategy::ByOrientation),
        }
    }
}

impl PrimitiveParams {
    /// Set the healing distance.
    #[must_use]
    pub const fn with_heal_distance(mut self, distance: f64) -> Self {
        self.heal_distance = distance;
        self
    }

    /// Set the welding distance.
    #[must_use]
    pub const fn with_weld_distance(mut self, distance: f64) -> Self {
        self.weld_distance = distance;
        self
    }

    /// Set the surface margin.
    #[must_use]
    pub const fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the boolean settings for the octant.
    #[must_use]
    pub const fn with_boolean(mut self, boolean: BooleanConfig) -> Self {
        self.boolean = boolean;
        self
    }
}

/// A primitive ready for trimming and cutting.
#[derive(Debug, Clone)]
pub struct PreparedPrimitive {
    /// Closed, outward-facing, welded boundary.
    pub mesh: IndexedMesh,
    /// At the top of the bounds, facing down.
    pub top: CutSurface,
    /// At the bottom of the bounds, facing up.
    pub bottom: CutSurface,
    /// Through the center, facing `-z`, `-x` and `-y`.
    pub symmetry: [CutSurface; 3],
    /// The `(-, -, -)` eighth of the primitive, capped.
    pub octant: IndexedMesh,
}

impl PreparedPrimitive {
    /// Top and bottom surfaces, for cutting the lattice.
    #[must_use]
    pub fn cut_surfaces(&self) -> [CutSurface; 2] {
        [self.top, self.bottom]
    }
}

/// Clean a primitive and derive its cut surfaces and octant.
///
/// # Errors
///
/// - [`LatticeError::EmptyPrimitive`] when there are no faces.
/// - [`LatticeError::PrimitivePreparation`] when the mesh encloses no
///   volume or is flat.
/// - [`LatticeError::Boolean`] when the octant cannot be cut.
///
/// # Example
///
/// ```
/// use mesh_lattice::{prepare_primitive, PrimitiveParams, RawGeometry};
/// use mesh_types::unit_cube;
///
/// let prepared = prepare_primitive(RawGeometry::Mesh(unit_cube()), &PrimitiveParams::default()).unwrap();
/// assert!((prepared.octant.volume() - 0.125).abs() < 1e-9);
/// ```
pub fn prepare_primitive(raw: RawGeometry, params: &PrimitiveParams) -> LatticeResult<PreparedPrimitive> {
    let mut mesh = match raw {
        RawGeometry::Mesh(mesh) => mesh,
        RawGeometry::Patches(patches) => {
            let mut joined = IndexedMesh::new();
            for patch in &patches {
                joined.merge(patch);
            }
            let healed = heal_naked_edges(&mut joined, params.heal_distance);
            debug!(patches = patches.len(), healed, "joined surface patches");
            joined
        }
    };
    if mesh.is_empty() {
        return Err(LatticeError::EmptyPrimitive);
    }
    if !mesh.indices_in_range() {
        return Err(LatticeError::PrimitivePreparation {
            reason: "faces reference missing vertices".to_string(),
        });
    }

    unify_triangle_normals(&mut mesh);
    weld_vertices(&mut mesh, params.weld_distance);
    remove_unreferenced_vertices(&mut mesh);
    let flipped = orient_triangles_outward(&mut mesh);

    let bounds = mesh.bounds();
    if bounds.is_degenerate(DEGENERATE_EXTENT) {
        return Err(LatticeError::PrimitivePreparation {
            reason: "primitive is flat".to_string(),
        });
    }
    let volume = mesh.signed_volume();
    if volume <= 0.0 {
        return Err(LatticeError::PrimitivePreparation {
            reason: format!("primitive encloses no volume ({volume})"),
        });
    }
    let report = validate_mesh("primitive", &mesh);
    if !report.closed_mesh {
        warn!(naked_edges = report.naked_edges, "primitive is not closed");
    }

    let (top, bottom) = trim_surfaces(&bounds, params.margin)?;
    let symmetry = symmetry_surfaces(&bounds, params.margin)?;
    let octant = cut_octant(&mesh, &symmetry, params)?;

    info!(
        faces = mesh.face_count(),
        flipped,
        volume,
        octant_faces = octant.face_count(),
        "prepared primitive"
    );
    Ok(PreparedPrimitive {
        mesh,
        top,
        bottom,
        symmetry,
        octant,
    })
}

/// Top and bottom planes at the z extremes, spanning the x/y extents
/// scaled by `margin` about the center.
fn trim_surfaces(bounds: &Aabb, margin: f64) -> LatticeResult<(CutSurface, CutSurface)> {
    let center = bounds.center();
    let half = bounds.size() * (0.5 * margin);
    let mut at_top = center;
    at_top.z = bounds.max.z;
    let mut at_bottom = center;
    at_bottom.z = bounds.min.z;

    let top = CutSurface::new(at_top, -Vector3::z(), Vector3::x(), [half.x, half.y])?;
    let bottom = CutSurface::new(at_bottom, Vector3::z(), Vector3::x(), [half.x, half.y])?;
    Ok((top, bottom))
}

/// Planes through the center with normals `-z`, `-x`, `-y`.
fn symmetry_surfaces(bounds: &Aabb, margin: f64) -> LatticeResult<[CutSurface; 3]> {
    let center = bounds.center();
    let half = bounds.size() * (0.5 * margin);
    Ok([
        CutSurface::new(center, -Vector3::z(), Vector3::x(), [half.x, half.y])?,
        CutSurface::new(center, -Vector3::x(), Vector3::y(), [half.y, half.z])?,
        CutSurface::new(center, -Vector3::y(), Vector3::z(), [half.z, half.x])?,
    ])
}

/// Cut by each symmetry plane in turn, capping after every cut so each
/// cap stays planar. Primitive faces lying in a symmetry plane are handled
/// by the configured coplanar strategy.
fn cut_octant(
    mesh: &IndexedMesh,
    symmetry: &[CutSurface; 3],
    params: &PrimitiveParams,
) -> LatticeResult<IndexedMesh> {
    let mut octant = mesh.clone();
    for surface in symmetry {
        octant = difference_with_sheets(&octant, &[surface.to_mesh()], &params.boolean)?;
        let filled = fill_holes(&mut octant, params.max_hole_edges)?;
        if !filled.is_complete() {
            warn!(skipped = filled.skipped, "octant cap left open");
        }
    }
    Ok(octant)
}
