//! Boolean difference against open sheets.
//!
//! Each cutter is a (near) planar sheet mesh. Material on the back side of
//! the sheet, opposite its normal, is removed; the side the normal points
//! into is kept. Subtracting several sheets is the same as clipping by each
//! of them in turn.

use crate::config::{BooleanConfig, CoplanarStrategy};
use crate::error::{BooleanError, BooleanResult};
use crate::intersect::Plane;
use hashbrown::HashMap;
use mesh_types::{Aabb, IndexedMesh, MeshBounds, Vertex};
use rayon::prelude::*;
use tracing::{debug, info};

/// Vertex count above which plane distances are computed on the rayon pool.
const PARALLEL_VERTEX_THRESHOLD: usize = 10_000;

/// Subtract the back sides of `cutters` from `mesh`.
///
/// Each cutter acts on its whole fitted plane once its bounding box touches
/// the mesh's. Cut faces are left open; closing them is a separate hole
/// filling step.
///
/// # Errors
///
/// - [`BooleanError::EmptyMesh`] if `mesh` has no faces.
/// - [`BooleanError::InvalidIndex`] if a face of `mesh` refers to a missing vertex.
/// - [`BooleanError::DegenerateCutter`] if a cutter has no area or no
///   consistent normal.
/// - [`BooleanError::CoplanarFaces`] if faces of `mesh` lie in a cutter
///   plane and the config says to reject that.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, IndexedMesh, Point3, MeshBounds};
/// use mesh_boolean::{difference_with_sheets, BooleanConfig};
///
/// // A square sheet at z = 0.5 facing down keeps the lower half.
/// let sheet = IndexedMesh::from_positions(
///     &[
///         Point3::new(-1.0, -1.0, 0.5),
///         Point3::new(2.0, -1.0, 0.5),
///         Point3::new(2.0, 2.0, 0.5),
///         Point3::new(-1.0, 2.0, 0.5),
///     ],
///     &[[0, 2, 1], [0, 3, 2]],
/// );
/// let half = difference_with_sheets(&unit_cube(), &[sheet], &BooleanConfig::default()).unwrap();
/// assert!((half.bounds().max.z - 0.5).abs() < 1e-12);
/// ```
pub fn difference_with_sheets(
    mesh: &IndexedMesh,
    cutters: &[IndexedMesh],
    config: &BooleanConfig,
) -> BooleanResult<IndexedMesh> {
    if mesh.faces.is_empty() {
        return Err(BooleanError::EmptyMesh {
            details: "mesh to cut has no faces".to_string(),
        });
    }
    let vertex_count = mesh.vertices.len();
    for face in &mesh.faces {
        if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(BooleanError::InvalidIndex {
                index,
                vertex_count,
            });
        }
    }

    let mut result = mesh.clone();
    for (index, cutter) in cutters.iter().enumerate() {
        let plane = Plane::fit(cutter).ok_or_else(|| BooleanError::DegenerateCutter {
            cutter: index,
            details: if cutter.is_empty() {
                "no faces".to_string()
            } else {
                "no area or no consistent normal".to_string()
            },
        })?;

        let reach = cutter.bounds().expanded(config.coplanar_tolerance);
        if result.is_empty() || !reach.intersects(&result.bounds()) {
            debug!(cutter = index, "cutter does not reach mesh");
            continue;
        }

        let mut distances = plane_distances(&result, &plane, config);
        let coplanar = coplanar_faces(&result, &distances, &reach, config.coplanar_tolerance);
        if !coplanar.is_empty() {
            match config.coplanar_strategy {
                CoplanarStrategy::Reject => {
                    return Err(BooleanError::CoplanarFaces {
                        cutter: index,
                        count: coplanar.len(),
                    });
                }
                CoplanarStrategy::KeepFront => {
                    debug!(cutter = index, coplanar = coplanar.len(), "keeping coplanar faces");
                }
                CoplanarStrategy::ByOrientation => {
                    let dropped = sort_coplanar(&mut result, &mut distances, &coplanar, &plane);
                    debug!(cutter = index, coplanar = coplanar.len(), dropped, "sorted coplanar faces");
                }
            }
        }

        result = clip(&result, &distances, config.edge_tolerance);
    }

    let result = compact(result);
    info!(
        cutters = cutters.len(),
        faces_before = mesh.faces.len(),
        faces_after = result.faces.len(),
        "sheet difference"
    );
    Ok(result)
}

fn plane_distances(mesh: &IndexedMesh, plane: &Plane, config: &BooleanConfig) -> Vec<f64> {
    let snap = |v: &Vertex| {
        let d = plane.signed_distance(&v.position);
        if d.abs() <= config.edge_tolerance { 0.0 } else { d }
    };
    if config.parallel && mesh.vertices.len() >= PARALLEL_VERTEX_THRESHOLD {
        mesh.vertices.par_iter().map(snap).collect()
    } else {
        mesh.vertices.iter().map(snap).collect()
    }
}

/// Indices of faces lying in the cutter plane within reach of the cutter.
fn coplanar_faces(
    mesh: &IndexedMesh,
    distances: &[f64],
    reach: &Aabb,
    tolerance: f64,
) -> Vec<usize> {
    mesh.faces
        .iter()
        .enumerate()
        .filter(|(_, face)| face.iter().all(|&i| distances[i as usize].abs() <= tolerance))
        .filter(|(i, _)| mesh.triangle(*i).is_some_and(|t| t.bounds().intersects(reach)))
        .map(|(i, _)| i)
        .collect()
}

/// Drop coplanar faces facing the kept side and pin the corners of the
/// others onto the plane so clipping keeps them whole.
///
/// Returns the number of faces dropped.
fn sort_coplanar(
    mesh: &mut IndexedMesh,
    distances: &mut [f64],
    coplanar: &[usize],
    plane: &Plane,
) -> usize {
    let mut drop = vec![false; mesh.faces.len()];
    for &i in coplanar {
        let facing = mesh
            .triangle(i)
            .map_or(0.0, |t| t.normal_unnormalized().dot(&plane.normal));
        if facing < 0.0 {
            for &v in &mesh.faces[i] {
                distances[v as usize] = 0.0;
            }
        } else {
            drop[i] = true;
        }
    }
    let dropped = drop.iter().filter(|&&d| d).count();
    let mut flags = drop.into_iter();
    mesh.faces.retain(|_| !flags.next().unwrap_or(false));
    dropped
}

/// Sutherland-Hodgman clip of every triangle to `distance >= 0`.
///
/// Crossing points are shared between the two triangles of an edge so the
/// result stays connected.
#[allow(clippy::cast_possible_truncation)]
fn clip(mesh: &IndexedMesh, distances: &[f64], edge_tolerance: f64) -> IndexedMesh {
    let mut vertices = mesh.vertices.clone();
    let mut faces = Vec::with_capacity(mesh.faces.len());
    let mut crossings: HashMap<(u32, u32), u32> = HashMap::new();

    for face in &mesh.faces {
        let d = face.map(|i| distances[i as usize]);
        if d.iter().all(|&x| x >= 0.0) {
            faces.push(*face);
            continue;
        }
        if d.iter().all(|&x| x <= 0.0) {
            continue;
        }

        let mut polygon: Vec<u32> = Vec::with_capacity(4);
        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            let (da, db) = (d[k], d[(k + 1) % 3]);
            if da >= 0.0 {
                polygon.push(a);
            }
            if (da < 0.0 && db > 0.0) || (da > 0.0 && db < 0.0) {
                let key = (a.min(b), a.max(b));
                let index = *crossings.entry(key).or_insert_with(|| {
                    let (lo, hi) = key;
                    let (dl, dh) = (distances[lo as usize], distances[hi as usize]);
                    let p = mesh.vertices[lo as usize].position;
                    let q = mesh.vertices[hi as usize].position;
                    let s = dl / (dl - dh);
                    vertices.push(Vertex::new(p + (q - p) * s));
                    (vertices.len() - 1) as u32
                });
                polygon.push(index);
            }
        }

        for k in 1..polygon.len().saturating_sub(1) {
            let tri = [polygon[0], polygon[k], polygon[k + 1]];
            if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
                faces.push(tri);
            }
        }
    }

    let mut out = IndexedMesh::from_parts(vertices, faces);
    drop_slivers(&mut out, edge_tolerance);
    out
}

/// Remove triangles whose area vanished after clipping.
fn drop_slivers(mesh: &mut IndexedMesh, edge_tolerance: f64) {
    let limit = edge_tolerance * edge_tolerance;
    let vertices = &mesh.vertices;
    mesh.faces.retain(|f| {
        let [a, b, c] = f.map(|i| vertices[i as usize].position);
        (b - a).cross(&(c - a)).norm() * 0.5 > limit
    });
}

/// Drop vertices no face refers to.
#[allow(clippy::cast_possible_truncation)]
fn compact(mesh: IndexedMesh) -> IndexedMesh {
    let mut remap = vec![u32::MAX; mesh.vertices.len()];
    let mut vertices = Vec::new();
    let mut faces = mesh.faces;
    for face in &mut faces {
        for index in face.iter_mut() {
            let slot = &mut remap[*index as usize];
            if *slot == u32::MAX {
                *slot = vertices.len() as u32;
                vertices.push(mesh.vertices[*index as usize].clone());
            }
            *index = *slot;
        }
    }
    IndexedMesh::from_parts(vertices, faces)
}
