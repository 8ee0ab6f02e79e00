//! End-to-end lattice generation.

use mesh_from_curves::VolumeSettings;
use mesh_repair::{MeshReport, RepairParams};
use mesh_types::{Aabb, IndexedMesh, Polyline};
use tracing::{info, info_span};

use crate::build::{build_lattice_mesh, repair_lattice_mesh};
use crate::cell::UnitCell;
use crate::cut::{CutParams, CutSurface, cut_with_retry};
use crate::error::{LatticeError, LatticeResult, PipelineWarning};
use crate::populate::{PopulateContext, PopulateParams, UniformLattice, populate_uniform};
use crate::primitive::{PreparedPrimitive, PrimitiveParams, RawGeometry, prepare_primitive};
use crate::trim::TrimParams;

/// Every tunable of [`run_pipeline`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineParams {
    /// Strut radius used for thickening.
    pub radius: f64,
    /// Grid settings for thickening.
    pub volume: VolumeSettings,
    /// Population settings.
    pub populate: PopulateParams,
    /// Trimming settings.
    pub trim: TrimParams,
    /// Repair settings for the thickened mesh.
    pub repair: RepairParams,
    /// Cutting settings.
    pub cut: CutParams,
    /// Primitive preparation settings.
    pub primitive: PrimitiveParams,
}

impl PipelineParams {
    /// Defaults throughout, with a grid fitted to `radius`.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            volume: VolumeSettings::for_radius(radius),
            populate: PopulateParams::default(),
            trim: TrimParams::default(),
            repair: RepairParams::default(),
            cut: CutParams::default(),
            primitive: PrimitiveParams::default(),
        }
    }

    /// Set the thickening grid.
    #[must_use]
    pub const fn with_volume(mut self, volume: VolumeSettings) -> Self {
        self.volume = volume;
        self
    }

    /// Set the cutting settings.
    #[must_use]
    pub const fn with_cut(mut self, cut: CutParams) -> Self {
        self.cut = cut;
        self
    }

    /// Run every batch stage in parallel or sequentially.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.populate.parallel = parallel;
        self.trim.parallel = parallel;
        self.volume.parallel = parallel;
        self.cut.boolean.parallel = parallel;
        self.primitive.boolean.parallel = parallel;
        self
    }
}

/// Which surfaces cut the thickened lattice.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CutSurfaces {
    /// No cut; the cut stage is skipped.
    #[default]
    None,
    /// The primitive's top and bottom surfaces.
    Primitive,
    /// Caller-supplied surfaces.
    Custom(Vec<CutSurface>),
}

/// The lattice to generate.
#[derive(Debug, Clone)]
pub struct LatticeInput {
    /// Repeating pattern.
    pub unit_cell: UnitCell,
    /// Voxels fully inside the primitive.
    pub core_voxels: Vec<Aabb>,
    /// Voxels crossing the primitive's surface.
    pub boundary_voxels: Vec<Aabb>,
    /// Surfaces for the final cut.
    pub cut_surfaces: CutSurfaces,
}

impl LatticeInput {
    /// A lattice over the given voxels with no final cut.
    #[must_use]
    pub const fn new(unit_cell: UnitCell, core_voxels: Vec<Aabb>, boundary_voxels: Vec<Aabb>) -> Self {
        Self {
            unit_cell,
            core_voxels,
            boundary_voxels,
            cut_surfaces: CutSurfaces::None,
        }
    }

    /// Set the final cut surfaces.
    #[must_use]
    pub fn with_cut_surfaces(mut self, cut_surfaces: CutSurfaces) -> Self {
        self.cut_surfaces = cut_surfaces;
        self
    }
}

/// Everything [`run_pipeline`] produces.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The prepared primitive with its surfaces and octant.
    pub primitive: PreparedPrimitive,
    /// Populated and trimmed curves.
    pub lattice: UniformLattice,
    /// The final mesh.
    pub mesh: IndexedMesh,
    /// Report on the raw thickened mesh.
    pub original_report: MeshReport,
    /// Report after repair.
    pub modified_report: MeshReport,
    /// Report after cutting, when a cut ran.
    pub cut_report: Option<MeshReport>,
    /// Enclosed volume of the final mesh.
    pub volume: f64,
    /// Surface area of the final mesh.
    pub area: f64,
    /// Recovered problems from every stage, in stage order.
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    /// The reports that were produced, in stage order.
    #[must_use]
    pub fn reports(&self) -> Vec<&MeshReport> {
        let mut reports = vec![&self.original_report, &self.modified_report];
        reports.extend(self.cut_report.as_ref());
        reports
    }
}

/// Generate a lattice mesh inside `raw`.
///
/// Stages run in order: prepare the primitive, populate and trim, thicken,
/// repair, and cut. Failed voxels are collected in
/// [`UniformLattice::errors`] and recovered problems in
/// [`PipelineOutput::warnings`]; only stage failures are returned as
/// errors.
///
/// # Errors
///
/// - [`LatticeError::InvalidRadius`] before any work is done.
/// - Any error of [`prepare_primitive`], [`populate_uniform`] or
///   [`build_lattice_mesh`].
pub fn run_pipeline(
    raw: RawGeometry,
    input: &LatticeInput,
    params: &PipelineParams,
) -> LatticeResult<PipelineOutput> {
    if !(params.radius > 0.0 && params.radius.is_finite()) {
        return Err(LatticeError::InvalidRadius(params.radius));
    }
    let _span = info_span!("lattice_pipeline", radius = params.radius).entered();

    let primitive = prepare_primitive(raw, &params.primitive)?;

    let ctx = PopulateContext::new(&input.unit_cell, &primitive.mesh);
    let lattice = populate_uniform(
        &ctx,
        &input.core_voxels,
        &input.boundary_voxels,
        &params.populate,
        &params.trim,
    )?;
    let mut warnings = lattice.warnings.clone();

    let curves: Vec<Polyline> = lattice
        .trimmed
        .iter()
        .chain(lattice.skin.curves())
        .cloned()
        .collect();
    let (raw_mesh, original_report) = build_lattice_mesh(&curves, params.radius, &params.volume)?;

    let repaired = repair_lattice_mesh(raw_mesh, &params.repair);
    warnings.extend(repaired.warning);

    let surfaces: Vec<CutSurface> = match &input.cut_surfaces {
        CutSurfaces::None => Vec::new(),
        CutSurfaces::Primitive => primitive.cut_surfaces().to_vec(),
        CutSurfaces::Custom(surfaces) => surfaces.clone(),
    };
    let (mesh, cut_report) = if surfaces.is_empty() {
        (repaired.mesh, None)
    } else {
        let outcome = cut_with_retry(&repaired.mesh, &surfaces, &params.cut);
        warnings.extend(outcome.warnings);
        (outcome.mesh, Some(outcome.report))
    };

    let volume = mesh.volume();
    let area = mesh.surface_area();
    info!(
        voxels = input.core_voxels.len() + input.boundary_voxels.len(),
        failed_voxels = lattice.errors.len(),
        curves = curves.len(),
        faces = mesh.face_count(),
        volume,
        area,
        warnings = warnings.len(),
        "lattice pipeline finished"
    );

    Ok(PipelineOutput {
        primitive,
        lattice,
        mesh,
        original_report,
        modified_report: repaired.report,
        cut_report,
        volume,
        area,
        warnings,
    })
}
