//! Property-based tests for mapping, population, trimming, repair, cutting
//! and the primitive octant.
//!
//! Run with: cargo test -p mesh-lattice --test proptest_lattice

use approx::assert_relative_eq;
use mesh_lattice::{
    BoxMap, CutParams, CutSurface, PopulateContext, PopulateKind, PopulateParams, PrimitiveParams,
    RawGeometry, TrimBoundary, TrimParams, UnitCell, VolumeSettings, build_lattice_mesh,
    cut_with_retry, populate, prepare_primitive, repair_lattice_mesh, trim_curve,
};
use mesh_repair::{ReportValue, keys, validate_mesh};
use mesh_types::{Aabb, IndexedMesh, MeshBounds, Point3, Polyline, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_box() -> impl Strategy<Value = Aabb> {
    (
        prop::array::uniform3(-50.0..50.0f64),
        prop::array::uniform3(0.5..20.0f64),
    )
        .prop_map(|([x, y, z], [sx, sy, sz])| {
            Aabb::new(Point3::new(x, y, z), Point3::new(x + sx, y + sy, z + sz))
        })
}

/// A voxel that is usable, flat, or inverted.
fn arb_voxel() -> impl Strategy<Value = Aabb> {
    prop_oneof![
        4 => arb_box(),
        1 => arb_box().prop_map(|mut b| {
            b.max.z = b.min.z;
            b
        }),
        1 => arb_box().prop_map(|b| Aabb { min: b.max, max: b.min }),
    ]
}

fn arb_polyline_in(lo: f64, hi: f64) -> impl Strategy<Value = Polyline> {
    prop::collection::vec(prop::array::uniform3(lo..hi), 2..8)
        .prop_map(|pts| Polyline::new(pts.into_iter().map(|[x, y, z]| Point3::new(x, y, z)).collect()))
}

fn square_cell() -> UnitCell {
    let p = Point3::new;
    UnitCell::new(
        vec![Polyline::new(vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 1.0),
        ])],
        Vec::new(),
    )
    .unwrap()
}

/// Octahedron with the given half-diagonals.
fn octahedron(center: Point3<f64>, radii: [f64; 3]) -> IndexedMesh {
    let [rx, ry, rz] = radii;
    let positions = [
        center + Vector3::new(rx, 0.0, 0.0),
        center - Vector3::new(rx, 0.0, 0.0),
        center + Vector3::new(0.0, ry, 0.0),
        center - Vector3::new(0.0, ry, 0.0),
        center + Vector3::new(0.0, 0.0, rz),
        center - Vector3::new(0.0, 0.0, rz),
    ];
    let faces = [
        [0, 2, 4],
        [1, 4, 2],
        [0, 4, 3],
        [1, 3, 4],
        [0, 5, 2],
        [1, 2, 5],
        [0, 3, 5],
        [1, 5, 3],
    ];
    IndexedMesh::from_positions(&positions, &faces)
}

/// L-profile prism filling `b`; the inner step sits at the center of `b`,
/// so two of its faces lie in symmetry planes.
fn l_bracket(b: &Aabb) -> IndexedMesh {
    let size = b.size();
    let profile = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0)];
    let at = |(x, z): (f64, f64), y: f64| {
        Point3::new(
            b.min.x + x * 0.5 * size.x,
            b.min.y + y * size.y,
            b.min.z + z * 0.5 * size.z,
        )
    };
    let mut positions: Vec<Point3<f64>> = profile.iter().map(|&p| at(p, 0.0)).collect();
    positions.extend(profile.iter().map(|&p| at(p, 1.0)));

    let fan = [[3, 4, 5], [3, 5, 0], [3, 0, 1], [3, 1, 2]];
    let mut faces: Vec<[u32; 3]> = fan.to_vec();
    faces.extend(fan.iter().map(|&[a, b, c]| [a + 6, c + 6, b + 6]));
    for a in 0..6u32 {
        let b = (a + 1) % 6;
        faces.push([a, a + 6, b + 6]);
        faces.push([a, b + 6, b]);
    }
    IndexedMesh::from_positions(&positions, &faces)
}

// =============================================================================
// Mapping
// =============================================================================

proptest! {
    #[test]
    fn mapping_onto_same_box_is_identity(b in arb_box(), curve in arb_polyline_in(-60.0, 60.0)) {
        let map = BoxMap::new(&b, &b).unwrap();
        let mapped = map.map(&curve);
        for (p, q) in curve.points().iter().zip(mapped.points()) {
            prop_assert!((p - q).norm() <= 1e-9 * (1.0 + p.coords.norm()));
        }
    }

    #[test]
    fn mapped_cell_fills_voxel(voxel in arb_box()) {
        let cell = square_cell();
        let map = BoxMap::new(cell.bounds(), &voxel).unwrap();
        let mapped = map.map(&cell.curves()[0]);
        let bounds = mapped.bounds();
        prop_assert!((bounds.min - voxel.min).norm() < 1e-9);
        prop_assert!((bounds.max - voxel.max).norm() < 1e-9);
    }
}

// =============================================================================
// Population
// =============================================================================

proptest! {
    #[test]
    fn population_is_index_aligned(
        voxels in prop::collection::vec(arb_voxel(), 0..24),
        parallel in any::<bool>(),
    ) {
        let cell = square_cell();
        let primitive = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)));
        let ctx = PopulateContext::new(&cell, &primitive);
        let params = PopulateParams::default().with_parallel(parallel);

        let population = populate(&ctx, &voxels, PopulateKind::CellOnly, &params);
        prop_assert_eq!(population.len(), voxels.len());

        for (i, (voxel, entry)) in voxels.iter().zip(&population.entries).enumerate() {
            let failed = population.errors.iter().any(|e| e.index == i);
            prop_assert_eq!(entry.is_none(), failed || !voxel.is_valid());
            if let Some(geometry) = entry {
                for g in geometry {
                    prop_assert!(voxel.expanded(1e-6).contains_box(&g.bounds(), 0.0));
                }
            }
            // Flat voxels are populated, flattened onto their plane.
            if voxel.is_valid() && voxel.size().z <= 0.0 {
                prop_assert!(!failed);
                prop_assert!(entry.is_some());
                for g in entry.iter().flatten() {
                    prop_assert!(g.bounds().size().z.abs() < 1e-9);
                }
            }
        }
    }
}

// =============================================================================
// Trimming
// =============================================================================

proptest! {
    #[test]
    fn curves_inside_convex_boundary_are_kept_whole(curve in arb_polyline_in(0.1, 3.9)) {
        let solid = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0)));
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        prop_assert_eq!(trimmed.pieces.len(), 1);
        for (p, q) in curve.points().iter().zip(trimmed.pieces[0].points()) {
            prop_assert!((p - q).norm() < 1e-9);
        }
    }

    #[test]
    fn curves_outside_convex_boundary_are_dropped(curve in arb_polyline_in(4.5, 9.0)) {
        let solid = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0)));
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        prop_assert!(trimmed.pieces.is_empty());
    }

    #[test]
    fn curves_inside_octahedron_are_kept_whole(curve in arb_polyline_in(-1.2, 1.2)) {
        let solid = octahedron(Point3::origin(), [4.0, 4.0, 4.0]);
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        prop_assert_eq!(trimmed.pieces.len(), 1);
        for (p, q) in curve.points().iter().zip(trimmed.pieces[0].points()) {
            prop_assert!((p - q).norm() < 1e-9);
        }
    }

    /// Inside the octahedron's bounding box but beyond its `x + y + z = 4` face.
    #[test]
    fn curves_outside_octahedron_are_dropped(curve in arb_polyline_in(1.5, 3.9)) {
        let solid = octahedron(Point3::origin(), [4.0, 4.0, 4.0]);
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        prop_assert!(trimmed.pieces.is_empty());
    }

    #[test]
    fn pieces_kept_by_octahedron_stay_inside(curve in arb_polyline_in(-5.0, 5.0)) {
        let solid = octahedron(Point3::origin(), [4.0, 4.0, 4.0]);
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        for piece in &trimmed.pieces {
            for p in piece.points() {
                prop_assert!(p.x.abs() + p.y.abs() + p.z.abs() <= 4.0 + 1e-6);
            }
        }
    }

    #[test]
    fn kept_pieces_stay_inside(curve in arb_polyline_in(-2.0, 6.0)) {
        let solid = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0)));
        let boundary = TrimBoundary::new(&solid).unwrap();

        let trimmed = trim_curve(&curve, &boundary, &TrimParams::default());
        for piece in &trimmed.pieces {
            prop_assert!(solid.bounds().expanded(1e-6).contains_box(&piece.bounds(), 0.0));
        }
    }
}

// =============================================================================
// Repair
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn repair_is_idempotent_and_outward(
        start in prop::array::uniform3(0.0..2.0f64),
        dir in prop::array::uniform3(0.5..2.0f64),
    ) {
        let a = Point3::new(start[0], start[1], start[2]);
        let strut = Polyline::from_segment(a, a + Vector3::new(dir[0], dir[1], dir[2]));
        let (raw, _) = build_lattice_mesh(&[strut], 0.3, &VolumeSettings::for_radius(0.3)).unwrap();

        let first = repair_lattice_mesh(raw, &Default::default());
        prop_assert!(first.mesh.signed_volume() >= 0.0);

        let second = repair_lattice_mesh(first.mesh.clone().into(), &Default::default());
        prop_assert_eq!(second.report.extra(keys::DEGENERATE_FACES), Some(&ReportValue::Count(0)));
        prop_assert_eq!(second.report.extra(keys::QUADS_TO_TRIS), Some(&ReportValue::Count(0)));
        prop_assert_eq!(second.report.extra(keys::MESH_FLIPPED), Some(&ReportValue::Bool(false)));
        prop_assert!(second.mesh.signed_volume() >= 0.0);
    }
}

// =============================================================================
// Cutting
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn coincident_cut_is_revised_not_collapsed(b in arb_box()) {
        let mesh = IndexedMesh::cuboid(&b);
        let size = b.size();
        let top = CutSurface::new(
            Point3::new(b.center().x, b.center().y, b.max.z),
            -Vector3::z(),
            Vector3::x(),
            [size.x * 0.6, size.y * 0.6],
        )
        .unwrap();

        let outcome = cut_with_retry(&mesh, &[top], &CutParams::default());
        prop_assert!(outcome.revised);
        let kept = outcome.mesh.bounds().volume();
        prop_assert!(kept > 0.5 * b.volume());
        prop_assert!(kept <= b.volume() * (1.0 + 1e-9));
        prop_assert_eq!(outcome.report.extra(keys::REVISED_CUT), Some(&ReportValue::Bool(true)));
    }
}

// =============================================================================
// Primitive
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn octant_lies_in_negative_corner(b in arb_box()) {
        let prepared = prepare_primitive(
            RawGeometry::Mesh(IndexedMesh::cuboid(&b)),
            &PrimitiveParams::default(),
        )
        .unwrap();
        let center = b.center();
        let octant = prepared.octant.bounds();
        let eps = 1e-9 * (1.0 + center.coords.norm());

        prop_assert!(octant.max.x <= center.x + eps);
        prop_assert!(octant.max.y <= center.y + eps);
        prop_assert!(octant.max.z <= center.z + eps);
        prop_assert!((octant.min - b.min).norm() < 1e-6);
        assert_relative_eq!(prepared.octant.volume(), b.volume() / 8.0, max_relative = 1e-6);
        prop_assert!(validate_mesh("octant", &prepared.octant).closed_mesh);
    }

    #[test]
    fn octahedron_octant_is_its_negative_corner(
        c in prop::array::uniform3(-20.0..20.0f64),
        radii in prop::array::uniform3(0.5..10.0f64),
    ) {
        let center = Point3::new(c[0], c[1], c[2]);
        let solid = octahedron(center, radii);
        let volume = solid.volume();
        let prepared = prepare_primitive(RawGeometry::Mesh(solid), &PrimitiveParams::default()).unwrap();
        let octant = prepared.octant.bounds();
        let eps = 1e-9 * (1.0 + center.coords.norm());

        prop_assert!(octant.max.x <= center.x + eps);
        prop_assert!(octant.max.y <= center.y + eps);
        prop_assert!(octant.max.z <= center.z + eps);
        let corner = center - Vector3::new(radii[0], radii[1], radii[2]);
        prop_assert!((octant.min - corner).norm() < 1e-6);
        assert_relative_eq!(prepared.octant.volume(), volume / 8.0, max_relative = 1e-6);
        prop_assert!(validate_mesh("octant", &prepared.octant).closed_mesh);
    }

    #[test]
    fn bracket_octant_keeps_faces_in_symmetry_planes(b in arb_box()) {
        let bracket = l_bracket(&b);
        let volume = bracket.volume();
        assert_relative_eq!(volume, 0.75 * b.volume(), max_relative = 1e-9);

        let prepared = prepare_primitive(RawGeometry::Mesh(bracket), &PrimitiveParams::default()).unwrap();
        let center = b.center();
        let octant = prepared.octant.bounds();
        let eps = 1e-9 * (1.0 + center.coords.norm());

        prop_assert!(octant.max.x <= center.x + eps);
        prop_assert!(octant.max.y <= center.y + eps);
        prop_assert!(octant.max.z <= center.z + eps);
        prop_assert!((octant.min - b.min).norm() < 1e-6);
        assert_relative_eq!(prepared.octant.volume(), volume / 6.0, max_relative = 1e-6);
        prop_assert!(validate_mesh("octant", &prepared.octant).closed_mesh);
    }

    #[test]
    fn inside_out_primitive_is_flipped(b in arb_box()) {
        let mut mesh = IndexedMesh::cuboid(&b);
        mesh.flip_normals();
        let prepared = prepare_primitive(mesh.into(), &PrimitiveParams::default()).unwrap();
        assert_relative_eq!(prepared.mesh.signed_volume(), b.volume(), max_relative = 1e-9);
    }
}
