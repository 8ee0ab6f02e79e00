//! Populating voxels with unit-cell geometry.
//!
//! Every voxel is mapped independently; results stay index-aligned with
//! the voxel list, and a failing voxel leaves an empty slot plus an entry
//! in the error list rather than stopping the batch.

use mesh_boolean::{BooleanConfig, intersect_meshes};
use mesh_types::{Aabb, Geometry, IndexedMesh, Polyline};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cell::UnitCell;
use crate::error::{LatticeResult, PipelineWarning, VoxelError};
use crate::map::BoxMap;
use crate::trim::{TrimBoundary, TrimParams, trim_all};

/// What to place in each voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PopulateKind {
    /// The joined unit-cell curves.
    CellOnly,
    /// The joined unit-cell curves followed by the connectivity geometry.
    CellAndConnectivity,
    /// The connectivity geometry alone.
    ConnectivityOnly,
    /// Curves where the mapped connectivity meshes cross the primitive.
    SkinIntersection,
}

/// Settings for [`populate`] and [`populate_uniform`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulateParams {
    /// Map voxels on the rayon pool.
    ///
    /// Default: `true`
    pub parallel: bool,
    /// Settings for the connectivity/primitive crossing in
    /// [`PopulateKind::SkinIntersection`].
    pub intersection: BooleanConfig,
}

impl Default for PopulateParams {
    fn default() -> Self {
        Self {
            parallel: true,
            intersection: BooleanConfig::default(),
        }
    }
}

impl PopulateParams {
    /// Enable or disable parallel population.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Shared read-only inputs of a population batch.
#[derive(Debug, Clone, Copy)]
pub struct PopulateContext<'a> {
    /// The repeating pattern.
    pub cell: &'a UnitCell,
    /// The boundary the lattice fills.
    pub primitive: &'a IndexedMesh,
}

impl<'a> PopulateContext<'a> {
    /// Bundle a unit cell and primitive.
    #[must_use]
    pub const fn new(cell: &'a UnitCell, primitive: &'a IndexedMesh) -> Self {
        Self { cell, primitive }
    }
}

/// Geometry placed in one voxel.
pub type MappedGeometry = Vec<Geometry>;

/// Index-aligned result of populating a voxel list.
#[derive(Debug, Default)]
pub struct Population {
    /// One slot per voxel; `None` where nothing was produced or the voxel failed.
    pub entries: Vec<Option<MappedGeometry>>,
    /// Voxels that failed, by index.
    pub errors: Vec<VoxelError>,
}

impl Population {
    /// Number of slots, equal to the number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Curves of every non-empty slot, in voxel order.
    pub fn curves(&self) -> impl Iterator<Item = &Polyline> + '_ {
        self.entries
            .iter()
            .flatten()
            .flatten()
            .filter_map(Geometry::as_curve)
    }

    /// Number of slots holding geometry.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

fn map_voxel(
    ctx: &PopulateContext<'_>,
    voxel: &Aabb,
    kind: PopulateKind,
    params: &PopulateParams,
) -> LatticeResult<MappedGeometry> {
    let map = BoxMap::new(ctx.cell.bounds(), voxel)?;
    let cell = || {
        ctx.cell
            .joined_curves()
            .iter()
            .map(|c| Geometry::Curve(map.map(c)))
    };
    let connectivity = || ctx.cell.connectivity().iter().map(|g| map.map(g));

    Ok(match kind {
        PopulateKind::CellOnly => cell().collect(),
        PopulateKind::CellAndConnectivity => cell().chain(connectivity()).collect(),
        PopulateKind::ConnectivityOnly => connectivity().collect(),
        PopulateKind::SkinIntersection => connectivity()
            .filter_map(Geometry::into_mesh)
            .flat_map(|mesh| intersect_meshes(ctx.primitive, &mesh, &params.intersection))
            .map(Geometry::Curve)
            .collect(),
    })
}

/// Place unit-cell geometry into every voxel.
///
/// The result has exactly one slot per voxel, in voxel order.
///
/// # Example
///
/// ```
/// use mesh_lattice::{populate, PopulateContext, PopulateKind, PopulateParams, UnitCell};
/// use mesh_types::{unit_cube, Aabb, Point3, Polyline};
///
/// let cell = UnitCell::new(
///     vec![Polyline::from_segment(Point3::origin(), Point3::new(1.0, 1.0, 1.0))],
///     Vec::new(),
/// )
/// .unwrap();
/// let primitive = unit_cube();
/// let voxels = vec![
///     Aabb::new(Point3::origin(), Point3::new(0.5, 0.5, 0.5)),
///     Aabb::empty(),
/// ];
///
/// let ctx = PopulateContext::new(&cell, &primitive);
/// let population = populate(&ctx, &voxels, PopulateKind::CellOnly, &PopulateParams::default());
/// assert_eq!(population.len(), 2);
/// assert!(population.entries[0].is_some());
/// assert!(population.entries[1].is_none());
/// assert_eq!(population.errors[0].index, 1);
/// ```
#[must_use]
pub fn populate(
    ctx: &PopulateContext<'_>,
    voxels: &[Aabb],
    kind: PopulateKind,
    params: &PopulateParams,
) -> Population {
    let work = |voxel: &Aabb| map_voxel(ctx, voxel, kind, params);
    let results: Vec<LatticeResult<MappedGeometry>> = if params.parallel {
        voxels.par_iter().map(work).collect()
    } else {
        voxels.iter().map(work).collect()
    };

    let mut population = Population {
        entries: Vec::with_capacity(results.len()),
        errors: Vec::new(),
    };
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(geometry) if !geometry.is_empty() => population.entries.push(Some(geometry)),
            Ok(_) => population.entries.push(None),
            Err(error) => {
                debug!(index, %error, "voxel skipped");
                population.entries.push(None);
                population.errors.push(VoxelError { index, error });
            }
        }
    }

    if !population.errors.is_empty() {
        warn!(
            kind = ?kind,
            failed = population.errors.len(),
            voxels = voxels.len(),
            "some voxels could not be populated"
        );
    }
    info!(
        kind = ?kind,
        voxels = voxels.len(),
        filled = population.filled_count(),
        "populated voxels"
    );
    population
}

/// Which voxel list a [`VoxelError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoxelSet {
    /// Voxels fully inside the primitive.
    Core,
    /// Voxels crossing the primitive's surface.
    Boundary,
}

/// A uniform strut lattice before meshing.
#[derive(Debug, Default)]
pub struct UniformLattice {
    /// Core voxels filled with cell curves.
    pub core: Population,
    /// Boundary voxels filled with cell curves.
    pub boundary: Population,
    /// Boundary voxels filled with connectivity.
    pub boundary_connectivity: Population,
    /// Crossing curves of boundary connectivity with the primitive.
    pub skin: Population,
    /// Core and boundary curves clipped to the primitive.
    pub trimmed: Vec<Polyline>,
    /// Failed voxels, one entry per voxel.
    pub errors: Vec<(VoxelSet, VoxelError)>,
    /// Problems recovered while trimming.
    pub warnings: Vec<PipelineWarning>,
}

/// Populate core and boundary voxels and trim the result to the primitive.
///
/// Core voxels get cell curves. Boundary voxels get cell curves,
/// connectivity, and skin curves. Curves from both sets are then trimmed
/// to the inside of the primitive.
///
/// # Errors
///
/// Fails only when the primitive cannot be prepared for trimming; voxel
/// failures are collected in [`UniformLattice::errors`].
pub fn populate_uniform(
    ctx: &PopulateContext<'_>,
    core_voxels: &[Aabb],
    boundary_voxels: &[Aabb],
    params: &PopulateParams,
    trim: &TrimParams,
) -> LatticeResult<UniformLattice> {
    let boundary = TrimBoundary::new(ctx.primitive)?;

    let core = populate(ctx, core_voxels, PopulateKind::CellOnly, params);
    let (cells, boundary_connectivity, skin) = if boundary_voxels.is_empty() {
        Default::default()
    } else {
        (
            populate(ctx, boundary_voxels, PopulateKind::CellOnly, params),
            populate(ctx, boundary_voxels, PopulateKind::ConnectivityOnly, params),
            populate(ctx, boundary_voxels, PopulateKind::SkinIntersection, params),
        )
    };

    let candidates: Vec<Polyline> = core.curves().chain(cells.curves()).cloned().collect();
    let trimmed = trim_all(&candidates, &boundary, trim);

    let mut lattice = UniformLattice {
        core,
        boundary: cells,
        boundary_connectivity,
        skin,
        trimmed: trimmed.curves,
        errors: Vec::new(),
        warnings: trimmed.warnings,
    };
    lattice.collect_errors();
    Ok(lattice)
}

impl UniformLattice {
    fn collect_errors(&mut self) {
        let mut errors: Vec<(VoxelSet, VoxelError)> = self
            .core
            .errors
            .drain(..)
            .map(|e| (VoxelSet::Core, e))
            .collect();
        for population in [
            &mut self.boundary,
            &mut self.boundary_connectivity,
            &mut self.skin,
        ] {
            for e in population.errors.drain(..) {
                if !errors
                    .iter()
                    .any(|(set, seen)| *set == VoxelSet::Boundary && seen.index == e.index)
                {
                    errors.push((VoxelSet::Boundary, e));
                }
            }
        }
        self.errors = errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{MeshBounds, Point3, unit_cube};

    fn cell() -> UnitCell {
        let p = |x, y, z| Point3::new(x, y, z);
        UnitCell::new(
            vec![
                Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)),
                Polyline::from_segment(p(1.0, 0.0, 0.0), p(0.0, 1.0, 1.0)),
            ],
            vec![Geometry::from(IndexedMesh::cuboid(&Aabb::new(
                p(0.0, 0.0, 0.0),
                p(1.0, 1.0, 1.0),
            )))],
        )
        .unwrap()
    }

    fn grid(n: i32, size: f64, origin: f64) -> Vec<Aabb> {
        let mut voxels = Vec::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let min = Point3::new(f64::from(i), f64::from(j), f64::from(k)) * size;
                    let min = min + mesh_types::Vector3::repeat(origin);
                    voxels.push(Aabb::new(min, min + mesh_types::Vector3::repeat(size)));
                }
            }
        }
        voxels
    }

    #[test]
    fn kinds_select_geometry() {
        let cell = cell();
        let prim = unit_cube();
        let ctx = PopulateContext::new(&cell, &prim);
        let voxels = grid(1, 0.5, 0.0);
        let params = PopulateParams::default();

        let count = |kind| populate(&ctx, &voxels, kind, &params).entries[0].as_ref().map_or(0, Vec::len);
        assert_eq!(count(PopulateKind::CellOnly), 2);
        assert_eq!(count(PopulateKind::CellAndConnectivity), 3);
        assert_eq!(count(PopulateKind::ConnectivityOnly), 1);
    }

    #[test]
    fn mapped_into_voxel_bounds() {
        let cell = cell();
        let prim = unit_cube();
        let ctx = PopulateContext::new(&cell, &prim);
        let voxels = grid(2, 0.5, 0.0);
        let population = populate(&ctx, &voxels, PopulateKind::CellAndConnectivity, &PopulateParams::default());
        for (voxel, entry) in voxels.iter().zip(&population.entries) {
            for g in entry.as_ref().unwrap() {
                assert!(voxel.contains_box(&g.bounds(), 1e-12));
            }
        }
    }

    #[test]
    fn flat_voxel_keeps_its_slot() {
        let cell = cell();
        let prim = unit_cube();
        let ctx = PopulateContext::new(&cell, &prim);
        let p = |x, y, z| Point3::new(x, y, z);
        let voxels = vec![
            Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)),
            Aabb::new(p(1.0, 0.0, 0.5), p(2.0, 1.0, 0.5)),
            Aabb { min: p(1.0, 1.0, 1.0), max: p(0.0, 0.0, 0.0) },
            Aabb::new(p(2.0, 0.0, 0.0), p(3.0, 1.0, 1.0)),
        ];
        let population = populate(&ctx, &voxels, PopulateKind::CellOnly, &PopulateParams::default());

        assert_eq!(population.len(), 4);
        assert_eq!(population.errors.len(), 1);
        assert_eq!(population.errors[0].index, 2);
        assert!(population.entries[2].is_none());
        for i in [0, 1, 3] {
            assert_eq!(population.entries[i].as_ref().map(Vec::len), Some(2));
        }
        for g in population.entries[1].iter().flatten() {
            let bounds = g.bounds();
            assert!((bounds.min.z - 0.5).abs() < 1e-12 && (bounds.max.z - 0.5).abs() < 1e-12);
        }
        assert!(population.entries[3].iter().flatten().all(|g| g.bounds().min.x >= 2.0 - 1e-12));
    }

    #[test]
    fn skin_follows_primitive_surface() {
        let cell = cell();
        let prim = unit_cube();
        let ctx = PopulateContext::new(&cell, &prim);
        // a voxel straddling the top face, and one well inside
        let voxels = vec![
            Aabb::new(Point3::new(0.25, 0.25, 0.75), Point3::new(0.75, 0.75, 1.25)),
            Aabb::new(Point3::new(0.25, 0.25, 0.25), Point3::new(0.75, 0.75, 0.5)),
        ];
        let skin = populate(&ctx, &voxels, PopulateKind::SkinIntersection, &PopulateParams::default());
        let curves: Vec<&Polyline> = skin.entries[0].iter().flatten().filter_map(Geometry::as_curve).collect();
        assert!(!curves.is_empty());
        assert!(curves.iter().flat_map(|c| c.points()).all(|p| (p.z - 1.0).abs() < 1e-9));
        assert!(skin.entries[1].is_none());
    }

    #[test]
    fn uniform_lattice_trims_boundary() {
        let cell = cell();
        // primitive smaller than the voxel grid
        let prim = IndexedMesh::cuboid(&Aabb::new(Point3::new(0.1, 0.1, 0.1), Point3::new(0.9, 0.9, 0.9)));
        let ctx = PopulateContext::new(&cell, &prim);
        let core = vec![Aabb::new(Point3::new(0.25, 0.25, 0.25), Point3::new(0.75, 0.75, 0.75))];
        let boundary = vec![
            Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.25, 0.25, 0.25)),
            Aabb::empty(),
        ];
        let lattice = populate_uniform(&ctx, &core, &boundary, &PopulateParams::default(), &TrimParams::default()).unwrap();

        assert_eq!(lattice.core.len(), 1);
        assert_eq!(lattice.boundary.len(), 2);
        assert_eq!(lattice.boundary_connectivity.len(), 2);
        assert_eq!(lattice.skin.len(), 2);
        assert_eq!(lattice.errors.len(), 1);
        assert_eq!(lattice.errors[0].0, VoxelSet::Boundary);
        assert_eq!(lattice.errors[0].1.index, 1);

        let inner = prim.bounds();
        assert!(!lattice.trimmed.is_empty());
        for curve in &lattice.trimmed {
            assert!(inner.contains_box(&curve.bounds(), 1e-9));
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let cell = cell();
        let prim = unit_cube();
        let ctx = PopulateContext::new(&cell, &prim);
        let voxels = grid(3, 1.0 / 3.0, 0.0);
        let a = populate(&ctx, &voxels, PopulateKind::CellOnly, &PopulateParams::default());
        let b = populate(&ctx, &voxels, PopulateKind::CellOnly, &PopulateParams::default().with_parallel(false));
        assert_eq!(a.entries, b.entries);
    }
}
