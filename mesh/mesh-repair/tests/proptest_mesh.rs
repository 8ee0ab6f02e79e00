//! Property-based tests for validation and repair.
//!
//! Run with: cargo test -p mesh-repair --test proptest_mesh

use mesh_repair::{
    RepairParams, RepairSummary, count_inconsistent_edges, repair_mesh, validate_poly_mesh,
    weld_vertices, ORIGINAL_REPORT,
};
use mesh_types::{Aabb, Face, IndexedMesh, PolyMesh, Point3, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_vertex() -> impl Strategy<Value = Vertex> {
    prop::array::uniform3(-100.0..100.0f64).prop_map(|[x, y, z]| Vertex::from_coords(x, y, z))
}

/// Arbitrary face soup; indices may point one or two past the vertex list.
fn arb_poly_soup() -> impl Strategy<Value = PolyMesh> {
    (3usize..30).prop_flat_map(|n| {
        let max = u32::try_from(n + 2).unwrap_or(u32::MAX);
        let face = prop_oneof![
            prop::array::uniform3(0..max).prop_map(Face::Tri),
            prop::array::uniform4(0..max).prop_map(Face::Quad),
        ];
        (
            prop::collection::vec(arb_vertex(), n),
            prop::collection::vec(face, 0..60),
        )
            .prop_map(|(vertices, faces)| PolyMesh::from_parts(vertices, faces))
    })
}

/// Box with quad faces wound outward.
fn quad_box(aabb: &Aabb) -> PolyMesh {
    let vertices = aabb.corners().into_iter().map(Vertex::new).collect();
    let faces = vec![
        Face::Quad([0, 2, 3, 1]),
        Face::Quad([4, 5, 7, 6]),
        Face::Quad([0, 1, 5, 4]),
        Face::Quad([2, 6, 7, 3]),
        Face::Quad([0, 4, 6, 2]),
        Face::Quad([1, 3, 7, 5]),
    ];
    PolyMesh::from_parts(vertices, faces)
}

/// Disjoint boxes with some faces reversed, plus the expected total volume.
fn arb_scrambled_boxes() -> impl Strategy<Value = (PolyMesh, f64)> {
    let one = (
        prop::array::uniform3(0.5..5.0f64),
        prop::collection::vec(any::<bool>(), 6),
    );
    prop::collection::vec(one, 1..4).prop_map(|boxes| {
        let mut mesh = PolyMesh::new();
        let mut volume = 0.0;
        for (k, ([sx, sy, sz], flips)) in boxes.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x0 = k as f64 * 10.0;
            let aabb = Aabb::new(Point3::new(x0, 0.0, 0.0), Point3::new(x0 + sx, sy, sz));
            volume += aabb.volume();

            let mut part = quad_box(&aabb);
            for (face, flip) in part.faces.iter_mut().zip(flips) {
                if flip {
                    *face = face.reversed();
                }
            }
            let offset = u32::try_from(mesh.vertices.len()).unwrap_or(0);
            mesh.vertices.extend(part.vertices);
            mesh.faces.extend(part.faces.into_iter().map(|f| match f {
                Face::Tri(v) => Face::Tri(v.map(|i| i + offset)),
                Face::Quad(v) => Face::Quad(v.map(|i| i + offset)),
            }));
        }
        (mesh, volume)
    })
}

/// Quads with three collinear corners, starting at any corner of the ring.
fn arb_collinear_quads() -> impl Strategy<Value = PolyMesh> {
    let one = (
        prop::array::uniform3(-50.0..50.0f64),
        0.5..10.0f64,
        0.1..0.9f64,
        (-10.0..10.0f64, 0.5..10.0f64),
        0usize..4,
    );
    prop::collection::vec(one, 1..6).prop_map(|quads| {
        let mut mesh = PolyMesh::new();
        for ([x, y, z], len, t, (s, h), start) in quads {
            let base = u32::try_from(mesh.vertices.len()).unwrap_or(0);
            mesh.vertices.push(Vertex::from_coords(x, y, z));
            mesh.vertices.push(Vertex::from_coords(x + t * len, y, z));
            mesh.vertices.push(Vertex::from_coords(x + len, y, z));
            mesh.vertices.push(Vertex::from_coords(x + s, y + h, z));
            let mut ring = [base, base + 1, base + 2, base + 3];
            ring.rotate_left(start);
            mesh.faces.push(Face::Quad(ring));
        }
        mesh
    })
}

fn arb_triangle_mesh() -> impl Strategy<Value = IndexedMesh> {
    (3usize..30).prop_flat_map(|n| {
        let max = u32::try_from(n).unwrap_or(u32::MAX);
        (
            prop::collection::vec(arb_vertex(), n),
            prop::collection::vec(prop::array::uniform3(0..max), 1..50),
        )
            .prop_map(|(vertices, faces)| IndexedMesh::from_parts(vertices, faces))
    })
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    /// A report is produced for any input, and validity agrees with the log.
    #[test]
    fn report_always_produced(mesh in arb_poly_soup()) {
        let report = validate_poly_mesh(ORIGINAL_REPORT, &mesh);
        prop_assert_eq!(report.vertex_count, mesh.vertex_count());
        prop_assert_eq!(report.valid_mesh, report.log_invalid.is_empty());
        prop_assert_eq!(report.entries().len(), 9);
    }

    /// Repair tolerates arbitrary soup, including bad indices.
    #[test]
    fn repair_never_panics(mesh in arb_poly_soup()) {
        let mut repaired = mesh.clone();
        let summary = repair_mesh(&mut repaired, &RepairParams::default());
        prop_assert!(summary.degenerate_faces <= mesh.face_count());
    }
}

// =============================================================================
// Repair sequence
// =============================================================================

proptest! {
    /// Repair leaves no quads, consistent winding and the true volume.
    #[test]
    fn repair_restores_closed_boxes((mesh, volume) in arb_scrambled_boxes()) {
        let mut repaired = mesh.clone();
        let summary = repair_mesh(&mut repaired, &RepairParams::default());

        prop_assert_eq!(summary.quads_to_tris, mesh.quad_count());
        prop_assert_eq!(repaired.quad_count(), 0);
        prop_assert_eq!(count_inconsistent_edges(&repaired.faces), 0);
        prop_assert!(repaired.signed_volume() >= 0.0);
        prop_assert!((repaired.signed_volume() - volume).abs() < 1e-9 * volume.max(1.0));
    }

    /// Running the sequence again finds nothing left to do.
    #[test]
    fn repair_is_idempotent((mesh, _) in arb_scrambled_boxes()) {
        let mut repaired = mesh;
        let _ = repair_mesh(&mut repaired, &RepairParams::default());
        let second = repair_mesh(&mut repaired, &RepairParams::default());
        prop_assert_eq!(second, RepairSummary::default());
    }

    /// Splitting a quad never creates a face the next pass would remove.
    #[test]
    fn collinear_quads_repair_once(mesh in arb_collinear_quads()) {
        let mut repaired = mesh.clone();
        let first = repair_mesh(&mut repaired, &RepairParams::default());
        prop_assert_eq!(first.degenerate_faces, 0);
        prop_assert_eq!(first.quads_to_tris, mesh.face_count());
        prop_assert_eq!(repaired.face_count(), 2 * mesh.face_count());

        let second = repair_mesh(&mut repaired, &RepairParams::default());
        prop_assert_eq!(second, RepairSummary::default());
    }
}

// =============================================================================
// Welding
// =============================================================================

proptest! {
    /// Welding never adds faces and keeps indices in range.
    #[test]
    fn weld_keeps_indices_valid(mesh in arb_triangle_mesh()) {
        let mut welded = mesh.clone();
        weld_vertices(&mut welded, 0.01);
        prop_assert!(welded.faces.len() <= mesh.faces.len());
        prop_assert!(welded.indices_in_range());
    }
}

#[test]
fn repaired_box_report_is_clean() {
    let mut mesh = quad_box(&Aabb::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0)));
    mesh.flip_normals();
    let summary = repair_mesh(&mut mesh, &RepairParams::default());
    assert!(summary.mesh_flipped);

    let report = validate_poly_mesh(ORIGINAL_REPORT, &mesh);
    assert!(report.valid_mesh);
    assert!(report.closed_mesh);
    assert!(report.manifold_mesh);
    assert_eq!(report.disjoint_count, 1);
}
