//! Thickening the curve network and repairing the result.

use mesh_from_curves::{VolumeSettings, thicken_curves};
use mesh_repair::{
    MODIFIED_REPORT, MeshReport, ORIGINAL_REPORT, RepairParams, RepairSummary, keys, repair_mesh,
    validate_poly_mesh,
};
use mesh_types::{IndexedMesh, PolyMesh, Polyline};
use tracing::{info, warn};

use crate::error::{LatticeError, LatticeResult, PipelineWarning};

/// Thicken `curves` by `radius` and report on the raw mesh.
///
/// The report is taken before any repair, so it shows the mesh exactly as
/// extraction produced it.
///
/// # Errors
///
/// Returns [`LatticeError::InvalidRadius`] for a radius that is not
/// positive and finite, and [`LatticeError::Curve`] if thickening fails.
///
/// # Example
///
/// ```
/// use mesh_lattice::build_lattice_mesh;
/// use mesh_from_curves::VolumeSettings;
/// use mesh_types::{Point3, Polyline};
///
/// let strut = Polyline::from_segment(Point3::origin(), Point3::new(3.0, 0.0, 0.0));
/// let (mesh, report) = build_lattice_mesh(&[strut], 0.5, &VolumeSettings::for_radius(0.5)).unwrap();
/// assert!(mesh.quad_count() > 0);
/// assert_eq!(report.version, "original_report");
/// ```
pub fn build_lattice_mesh(
    curves: &[Polyline],
    radius: f64,
    settings: &VolumeSettings,
) -> LatticeResult<(PolyMesh, MeshReport)> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(LatticeError::InvalidRadius(radius));
    }
    let mesh = thicken_curves(curves, radius, settings)?;
    let report = validate_poly_mesh(ORIGINAL_REPORT, &mesh);
    info!(
        curves = curves.len(),
        faces = mesh.face_count(),
        closed = report.closed_mesh,
        "built lattice mesh"
    );
    Ok((mesh, report))
}

/// Output of [`repair_lattice_mesh`].
#[derive(Debug, Clone)]
pub struct RepairedMesh {
    /// The repaired all-triangle mesh.
    pub mesh: IndexedMesh,
    /// Report with the repair counters appended.
    pub report: MeshReport,
    /// Counts from the repair passes.
    pub summary: RepairSummary,
    /// Set when the mesh is still invalid.
    pub warning: Option<PipelineWarning>,
}

/// Run the fixed repair sequence and report on the result.
///
/// The report carries `degenerate_faces`, `quads_to_tris` and
/// `mesh_flipped` after the core keys. A mesh that is still invalid keeps
/// its problems in `log_invalid` and produces a warning; it is never
/// dropped.
#[must_use]
pub fn repair_lattice_mesh(mut mesh: PolyMesh, params: &RepairParams) -> RepairedMesh {
    let summary = repair_mesh(&mut mesh, params);
    let report = validate_poly_mesh(MODIFIED_REPORT, &mesh)
        .with_extra(keys::DEGENERATE_FACES, summary.degenerate_faces)
        .with_extra(keys::QUADS_TO_TRIS, summary.quads_to_tris)
        .with_extra(keys::MESH_FLIPPED, summary.mesh_flipped);

    let warning = incomplete_repair(&report);
    RepairedMesh {
        mesh: mesh.into_indexed(),
        report,
        summary,
        warning,
    }
}

/// A warning for a report whose mesh is invalid.
pub(crate) fn incomplete_repair(report: &MeshReport) -> Option<PipelineWarning> {
    if report.valid_mesh {
        return None;
    }
    warn!(stage = %report.version, log = %report.log_invalid, "mesh invalid after repair");
    Some(PipelineWarning::MeshRepairIncomplete {
        stage: report.version.clone(),
        log: report.log_invalid.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_repair::ReportValue;
    use mesh_types::{Face, Point3, Vertex};

    fn strut() -> Vec<Polyline> {
        vec![Polyline::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 1.0),
        ])]
    }

    #[test]
    fn original_report_precedes_repair() {
        let (mesh, report) = build_lattice_mesh(&strut(), 0.4, &VolumeSettings::for_radius(0.4)).unwrap();
        assert_eq!(report.version, ORIGINAL_REPORT);
        assert!(report.extras.is_empty());
        assert!(mesh.quad_count() > 0);
    }

    #[test]
    fn repair_reports_counters() {
        let (mesh, _) = build_lattice_mesh(&strut(), 0.4, &VolumeSettings::for_radius(0.4)).unwrap();
        let quads = mesh.quad_count();
        let repaired = repair_lattice_mesh(mesh, &RepairParams::default());

        let keys_in_order: Vec<&str> = repaired.report.extras.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys_in_order, [keys::DEGENERATE_FACES, keys::QUADS_TO_TRIS, keys::MESH_FLIPPED]);
        assert_eq!(repaired.report.extra(keys::QUADS_TO_TRIS), Some(&ReportValue::Count(quads)));
        assert!(repaired.mesh.signed_volume() > 0.0);
        assert!(repaired.report.closed_mesh);
        assert!(repaired.warning.is_none());
    }

    #[test]
    fn second_repair_changes_nothing() {
        let (mesh, _) = build_lattice_mesh(&strut(), 0.4, &VolumeSettings::for_radius(0.4)).unwrap();
        let first = repair_lattice_mesh(mesh, &RepairParams::default());
        let second = repair_lattice_mesh(PolyMesh::from(first.mesh), &RepairParams::default());
        assert_eq!(second.summary.degenerate_faces, 0);
        assert_eq!(second.summary.quads_to_tris, 0);
        assert!(!second.summary.mesh_flipped);
    }

    #[test]
    fn invalid_mesh_still_reported() {
        let mut mesh = PolyMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.faces.push(Face::Tri([0, 1, 2]));
        let repaired = repair_lattice_mesh(mesh, &RepairParams::default());
        assert!(!repaired.report.valid_mesh);
        assert!(!repaired.report.log_invalid.is_empty());
        assert!(matches!(
            repaired.warning,
            Some(PipelineWarning::MeshRepairIncomplete { ref stage, .. }) if stage == MODIFIED_REPORT
        ));
    }

    #[test]
    fn bad_radius() {
        assert!(matches!(
            build_lattice_mesh(&strut(), 0.0, &VolumeSettings::default()),
            Err(LatticeError::InvalidRadius(_))
        ));
    }
}
