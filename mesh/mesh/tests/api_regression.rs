//! API Regression Tests for the Lattice Toolkit
//!
//! These tests serve as a regression suite to ensure the public API remains
//! stable and consistent across the mesh crates. They are organized in 5
//! tiers of increasing complexity:
//!
//! - Tier 1: Foundation (mesh-types)
//! - Tier 2: Core Operations (mesh-repair, mesh-io)
//! - Tier 3: Geometry Kernels (mesh-sdf, mesh-boolean, mesh-from-curves)
//! - Tier 4: Lattice Stages (mesh-lattice components)
//! - Tier 5: End to End (pipeline plus sinks)
//!
//! If any of these tests fail after API changes, it indicates a breaking change
//! that needs documentation and a version bump.

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::uninlined_format_args)]

use mesh::{prelude::*, repair, types};

fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, y, z)
}

// =============================================================================
// TIER 1: Foundation - Basic Types
// =============================================================================

mod tier1_foundation {
    use super::*;

    #[test]
    fn vertex_creation_and_access() {
        let v = types::Vertex::from_coords(1.0, 2.0, 3.0);
        assert!((v.position.x - 1.0).abs() < f64::EPSILON);
        assert!((v.position.z - 3.0).abs() < f64::EPSILON);

        let v2 = types::Vertex::new(p(4.0, 5.0, 6.0));
        assert!((v2.position.x - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn indexed_mesh_construction() {
        let mesh = IndexedMesh::new();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.faces.is_empty());

        let mesh = IndexedMesh::from_positions(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], &[[0, 1, 2]]);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn cuboid_measures() {
        let b = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0)));
        assert_eq!(b.face_count(), 12);
        assert!((b.signed_volume() - 6.0).abs() < 1e-12);
        assert!((b.surface_area() - 22.0).abs() < 1e-12);
        assert_eq!(b.bounds().max, p(1.0, 2.0, 3.0));
    }

    #[test]
    fn poly_mesh_quads() {
        let mut mesh = PolyMesh::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.vertices.push(types::Vertex::from_coords(x, y, 0.0));
        }
        mesh.faces.push(types::Face::Quad([0, 1, 2, 3]));
        assert_eq!(mesh.quad_count(), 1);
        assert_eq!(mesh.into_indexed().face_count(), 2);
    }

    #[test]
    fn polyline_parameter_domain() {
        let line = Polyline::new(vec![p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 2.0, 0.0)]);
        assert!((line.domain_end() - 2.0).abs() < f64::EPSILON);
        assert_eq!(line.point_at(0.5), Some(p(1.0, 0.0, 0.0)));
        assert!((line.length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn geometry_wraps_both_kinds() {
        let curve = Geometry::from(Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)));
        let mesh = Geometry::from(types::unit_cube());
        assert!(curve.as_curve().is_some());
        assert!(mesh.as_mesh().is_some());
    }
}

// =============================================================================
// TIER 2: Core Operations - Repair, I/O
// =============================================================================

mod tier2_core_operations {
    use super::*;
    use mesh::repair::{RepairParams, RepairSummary, ReportValue, keys};

    #[test]
    fn repair_params_builder_pattern() {
        let params = RepairParams::default();
        assert!(params.weld_epsilon > 0.0);
        assert!((params.heal_distance - 0.01).abs() < f64::EPSILON);

        let params = RepairParams::default()
            .with_weld_epsilon(1e-5)
            .with_degenerate_area_threshold(1e-8)
            .with_heal_distance(0.1)
            .with_remove_unreferenced(true);
        assert!((params.weld_epsilon - 1e-5).abs() < f64::EPSILON);
        assert!((params.degenerate_area_threshold - 1e-8).abs() < f64::EPSILON);
    }

    #[test]
    fn repair_summary_usage() {
        let summary = RepairSummary::default();
        assert_eq!(summary.degenerate_faces, 0);
        assert!(format!("{}", summary).contains("quads_to_tris"));
    }

    #[test]
    fn repair_flips_inside_out_mesh() {
        let mut cube = types::unit_cube();
        cube.flip_normals();
        let mut mesh = PolyMesh::from(cube);
        let summary = repair::repair_mesh(&mut mesh, &RepairParams::default());
        assert!(summary.mesh_flipped);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn mesh_report_keys() {
        let report = validate_mesh(repair::ORIGINAL_REPORT, &types::unit_cube());
        assert!(report.valid_mesh);
        assert!(report.closed_mesh);
        assert!(report.manifold_mesh);
        assert_eq!(report.naked_edges, 0);
        assert_eq!(report.disjoint_count, 1);
        assert_eq!(report.vertex_count, 8);

        let names: Vec<&str> = report.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names[0], keys::REPORT_VERSION);
        assert_eq!(names.last(), Some(&keys::LOG_INVALID));

        let extended = report.with_extra(keys::REVISED_CUT, true);
        assert_eq!(extended.extra(keys::REVISED_CUT), Some(&ReportValue::Bool(true)));
    }

    #[test]
    fn report_record_is_keyed_by_version() {
        let report = validate_mesh(repair::CUT_REPORT, &types::unit_cube());
        let record = mesh::io::report_record(&report).unwrap();
        assert!(record.get("cut_report").is_some());
    }

    #[test]
    fn combine_reports_indents_four_spaces() {
        let combined = mesh::io::combine_reports(&[r#"{"a": 1}"#, r#"{"b": true}"#]).unwrap();
        assert_eq!(combined, "{\n    \"a\": 1,\n    \"b\": true\n}");
    }

    #[test]
    fn artifact_paths_from_part_id() {
        let paths = mesh::io::ArtifactPaths::new("out", "part-7");
        assert!(paths.mesh.ends_with("part-7.stl"));
        assert!(paths.log.ends_with("part-7.txt"));
    }

    #[test]
    fn stl_export_round_trip() {
        use mesh::io::{ExportOptions, StlFormat, export_stl, load_stl};

        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::default().with_format(StlFormat::Ascii).with_remove_after_export(true);
        let exported = export_stl(types::unit_cube(), dir.path().join("cube"), &options).unwrap();
        assert!(exported.mesh.is_none());
        assert!(exported.path.ends_with("cube.stl"));

        let loaded = load_stl(&exported.path).unwrap();
        assert_eq!(loaded.face_count(), 12);
        approx::assert_relative_eq!(loaded.volume(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn log_file_is_comma_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        mesh::io::append_record(&path, "{}").unwrap();
        mesh::io::append_record(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{},\n{}");
    }
}

// =============================================================================
// TIER 3: Geometry Kernels - SDF, Boolean, Thickening
// =============================================================================

mod tier3_kernels {
    use super::*;

    #[test]
    fn sdf_containment() {
        let sdf = mesh::sdf::SignedDistanceField::new(types::unit_cube()).unwrap();
        assert!(sdf.is_inside(p(0.5, 0.5, 0.5)));
        assert!(sdf.is_strictly_inside(p(0.5, 0.5, 0.5), 1e-3));
        assert!(!sdf.is_strictly_inside(p(0.5, 0.5, 0.9999), 1e-3));
        assert!(!sdf.is_inside(p(2.0, 0.5, 0.5)));
    }

    #[test]
    fn boolean_config_presets() {
        use mesh::boolean::{BooleanConfig, CoplanarStrategy};

        let default = BooleanConfig::default();
        let scans = BooleanConfig::for_scans();
        let cad = BooleanConfig::for_cad();
        assert!(scans.vertex_weld_tolerance > default.vertex_weld_tolerance);
        assert!(cad.vertex_weld_tolerance < default.vertex_weld_tolerance);

        let config = BooleanConfig::default()
            .with_coplanar_strategy(CoplanarStrategy::KeepFront)
            .with_parallel(false);
        assert_eq!(config.coplanar_strategy, CoplanarStrategy::KeepFront);
        assert!(!config.parallel);
    }

    #[test]
    fn sheet_difference_keeps_normal_side() {
        use mesh::boolean::{BooleanConfig, difference_with_sheets};

        let cube = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)));
        let sheet = CutSurface::new(p(1.0, 1.0, 1.0), -Vector3::z(), Vector3::x(), [2.0, 2.0]).unwrap();
        let cut = difference_with_sheets(&cube, &[sheet.to_mesh()], &BooleanConfig::default()).unwrap();
        assert!(cut.bounds().max.z <= 1.0 + 1e-9);
        assert!((cut.bounds().min.z).abs() < 1e-9);
    }

    #[test]
    fn polyline_mesh_crossings() {
        use mesh::boolean::{Bvh, intersect_polyline_mesh};

        let cube = types::unit_cube();
        let bvh = Bvh::build(&cube, 8, false);
        let line = Polyline::from_segment(p(-1.0, 0.3, 0.4), p(2.0, 0.3, 0.4));
        let hits = intersect_polyline_mesh(&line, &cube, &bvh, 1e-9);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn thicken_single_strut() {
        use mesh::from_curves::{VolumeSettings, thicken_curves};

        let strut = Polyline::from_segment(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let mesh = thicken_curves(&[strut], 0.25, &VolumeSettings::for_radius(0.25)).unwrap();
        assert!(!mesh.is_empty());
        let b = mesh.bounds();
        assert!(b.max.x > 2.0 && b.min.x < 0.0);
    }

    #[test]
    fn segment_points_include_ends() {
        let line = Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let points = mesh::from_curves::segment_points(&[line], 1.0);
        assert_eq!(points[0].first(), Some(&p(0.0, 0.0, 0.0)));
        assert_eq!(points[0].last(), Some(&p(1.0, 0.0, 0.0)));
    }
}

// =============================================================================
// TIER 4: Lattice Stages
// =============================================================================

mod tier4_lattice_stages {
    use super::*;
    use mesh::lattice::{
        BoxMap, CutParams, PopulateContext, PopulateKind, PopulateParams, PrimitiveParams, TrimBoundary,
        TrimParams, cut_with_retry, join_curves, populate, prepare_primitive, trim_curve,
    };

    #[test]
    fn box_map_scales_per_axis() {
        let map = BoxMap::new(
            &Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)),
            &Aabb::new(p(10.0, 0.0, 0.0), p(12.0, 3.0, 4.0)),
        )
        .unwrap();
        assert_eq!(map.apply(&p(0.5, 0.5, 0.5)), p(11.0, 1.5, 2.0));
    }

    #[test]
    fn degenerate_source_box_is_rejected() {
        let flat = Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0));
        let err = BoxMap::new(&flat, &flat).unwrap_err();
        assert!(matches!(err, mesh::lattice::LatticeError::DegenerateBounds { .. }));
    }

    #[test]
    fn curves_join_end_to_end() {
        let a = Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let b = Polyline::from_segment(p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0));
        let joined = join_curves(&[a, b], 1e-6);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].len(), 3);
    }

    #[test]
    fn population_keeps_voxel_order() {
        let cell = UnitCell::new(vec![Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))], Vec::new()).unwrap();
        let primitive = types::unit_cube();
        let voxels = vec![
            Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)),
            Aabb::empty(),
            Aabb::new(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0)),
        ];
        let ctx = PopulateContext::new(&cell, &primitive);
        let population = populate(&ctx, &voxels, PopulateKind::CellOnly, &PopulateParams::default());

        assert_eq!(population.len(), 3);
        assert!(population.entries[1].is_none());
        assert_eq!(population.errors.len(), 1);
        let last = population.entries[2].as_ref().unwrap();
        assert_eq!(last[0].bounds().min, p(5.0, 5.0, 5.0));
    }

    #[test]
    fn trimming_clips_to_boundary() {
        let cube = types::unit_cube();
        let boundary = TrimBoundary::new(&cube).unwrap();
        let line = Polyline::from_segment(p(0.5, 0.3, 0.4), p(3.0, 0.3, 0.4));
        let trimmed = trim_curve(&line, &boundary, &TrimParams::default());
        assert_eq!(trimmed.pieces.len(), 1);
        assert!((trimmed.pieces[0].length() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cut_retry_on_coincident_surface() {
        let cube = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let top = CutSurface::new(p(0.5, 0.5, 1.0), -Vector3::z(), Vector3::x(), [1.0, 1.0]).unwrap();
        let outcome = cut_with_retry(&cube, &[top], &CutParams::default());
        assert!(outcome.revised);
        assert!(outcome.mesh.bounds().volume() > 0.9);
        assert_eq!(outcome.report.version, repair::CUT_REPORT);
    }

    #[test]
    fn primitive_octant() {
        let solid = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)));
        let prepared = prepare_primitive(RawGeometry::Mesh(solid), &PrimitiveParams::default()).unwrap();
        assert!(prepared.octant.bounds().max.x <= 1.0 + 1e-9);
        assert!((prepared.octant.volume() - 1.0).abs() < 1e-9);
        assert_eq!(prepared.cut_surfaces().len(), 2);
    }
}

// =============================================================================
// TIER 5: End to End
// =============================================================================

mod tier5_end_to_end {
    use super::*;

    #[test]
    fn pipeline_then_sinks() {
        use mesh::io::{ArtifactMetadata, ExportOptions, append_record, combine_reports, export_stl, report_record};

        let cell = UnitCell::new(
            vec![
                Polyline::from_segment(p(0.0, 0.5, 0.5), p(1.0, 0.5, 0.5)),
                Polyline::from_segment(p(0.5, 0.0, 0.5), p(0.5, 1.0, 0.5)),
            ],
            Vec::new(),
        )
        .unwrap();
        let solid = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(3.0, 3.0, 3.0)));
        let input = LatticeInput::new(cell, vec![Aabb::new(p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0))], Vec::new());
        let output = run_pipeline(RawGeometry::Mesh(solid), &input, &PipelineParams::new(0.15)).unwrap();
        assert!(output.volume > 0.0);
        assert!(output.cut_report.is_none());

        let dir = tempfile::tempdir().unwrap();
        let meta = ArtifactMetadata::new("part-1", "2024-01-01T00:00:00", "millimeter").with_save_dir(dir.path());
        let paths = meta.paths.clone().unwrap();
        let exported = export_stl(output.mesh.clone(), paths.mesh_base(), &ExportOptions::default()).unwrap();
        assert!(exported.path.exists());

        let mut records = vec![meta.to_record().unwrap().to_string()];
        for report in output.reports() {
            records.push(report_record(report).unwrap().to_string());
        }
        append_record(&paths.log, &combine_reports(&records).unwrap()).unwrap();

        let log = std::fs::read_to_string(&paths.log).unwrap();
        assert!(log.contains("\"original_report\""));
        assert!(log.contains("\"modified_report\""));
        assert!(log.contains("\"part_id\""));
    }
}

// =============================================================================
// Error Handling Patterns
// =============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn boolean_empty_mesh_error() {
        use mesh::boolean::{BooleanConfig, difference_with_sheets};

        let sheet = CutSurface::new(p(0.0, 0.0, 0.0), Vector3::z(), Vector3::x(), [1.0, 1.0]).unwrap();
        let result = difference_with_sheets(&IndexedMesh::new(), &[sheet.to_mesh()], &BooleanConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn empty_unit_cell_error() {
        let result = UnitCell::new(Vec::new(), Vec::new());
        assert!(matches!(result, Err(mesh::lattice::LatticeError::EmptyUnitCell)));
    }

    #[test]
    fn invalid_radius_error() {
        let result = mesh::lattice::build_lattice_mesh(&[], -1.0, &mesh::lattice::VolumeSettings::default());
        assert!(matches!(result, Err(mesh::lattice::LatticeError::InvalidRadius(_))));
    }
}
