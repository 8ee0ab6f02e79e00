//! Curve/mesh and mesh/mesh intersection.
//!
//! Both queries go through a [`Bvh`] of the target mesh so that only
//! triangles near a segment (or near a source triangle) are tested.

use crate::bvh::Bvh;
use crate::config::BooleanConfig;
use crate::intersect::{segment_triangle_intersect, triangle_triangle_segment};
use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, Point3, Polyline, Triangle};
use rayon::prelude::*;
use tracing::debug;

/// One crossing of a polyline with a mesh surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveHit {
    /// Index of the polyline segment that crosses.
    pub segment: usize,
    /// Fraction along that segment.
    pub t: f64,
    /// The crossing point.
    pub point: Point3<f64>,
    /// Face of the mesh that was crossed.
    pub face: u32,
}

impl CurveHit {
    /// Polyline parameter of the hit (`segment + t`).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn parameter(&self) -> f64 {
        self.segment as f64 + self.t
    }
}

/// All crossings of `curve` with the surface of `mesh`, ordered along the
/// curve.
///
/// A crossing through a shared edge or vertex is reported once per face
/// it touches; callers that split at the hits are expected to collapse
/// near-equal parameters.
///
/// `bvh` must have been built from `mesh`.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, Point3, Polyline};
/// use mesh_boolean::{intersect_polyline_mesh, Bvh};
///
/// let cube = unit_cube();
/// let bvh = Bvh::build(&cube, 8, false);
/// let line = Polyline::from_segment(Point3::new(-1.0, 0.3, 0.4), Point3::new(2.0, 0.3, 0.4));
/// let hits = intersect_polyline_mesh(&line, &cube, &bvh, 1e-9);
/// assert_eq!(hits.len(), 2);
/// assert!(hits[0].t < hits[1].t);
/// ```
#[must_use]
pub fn intersect_polyline_mesh(
    curve: &Polyline,
    mesh: &IndexedMesh,
    bvh: &Bvh,
    tolerance: f64,
) -> Vec<CurveHit> {
    let mut hits = Vec::new();
    for (segment, (a, b)) in curve.segments().enumerate() {
        for face in bvh.query_segment(&a, &b, tolerance) {
            let Some(triangle) = mesh.triangle(face as usize) else {
                continue;
            };
            if let Some(hit) = segment_triangle_intersect(&a, &b, &triangle, tolerance) {
                hits.push(CurveHit {
                    segment,
                    t: hit.t,
                    point: hit.point,
                    face,
                });
            }
        }
    }
    hits.sort_by(|x, y| x.parameter().total_cmp(&y.parameter()).then(x.face.cmp(&y.face)));
    hits
}

/// Curves along which the surfaces of `a` and `b` cross.
///
/// Triangle pairs are found through a BVH of `b`; the crossing segments
/// are chained end to end into polylines. Chains that return to their
/// start come back closed (first point repeated at the end).
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, IndexedMesh, Point3, Aabb};
/// use mesh_boolean::{intersect_meshes, BooleanConfig};
///
/// let cube = unit_cube();
/// let slab = IndexedMesh::cuboid(&Aabb::new(
///     Point3::new(-1.0, -1.0, 0.4),
///     Point3::new(2.0, 2.0, 0.6),
/// ));
/// let curves = intersect_meshes(&slab, &cube, &BooleanConfig::default());
/// assert_eq!(curves.len(), 2);
/// assert!(curves.iter().all(|c| c.is_closed(1e-9)));
/// ```
#[must_use]
pub fn intersect_meshes(a: &IndexedMesh, b: &IndexedMesh, config: &BooleanConfig) -> Vec<Polyline> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let bvh = Bvh::build(b, config.bvh_leaf_size, config.parallel);
    let tolerance = config.vertex_weld_tolerance;

    let crossings = |face: usize| -> Vec<(Point3<f64>, Point3<f64>)> {
        let Some(tri) = a.triangle(face) else {
            return Vec::new();
        };
        bvh.query(&tri.bounds(), tolerance)
            .into_iter()
            .filter_map(|other| b.triangle(other as usize))
            .filter_map(|other: Triangle| triangle_triangle_segment(&tri, &other, tolerance))
            .collect()
    };

    let segments: Vec<(Point3<f64>, Point3<f64>)> = if config.parallel {
        (0..a.faces.len()).into_par_iter().flat_map_iter(crossings).collect()
    } else {
        (0..a.faces.len()).flat_map(crossings).collect()
    };
    debug!(segments = segments.len(), "mesh intersection segments");

    chain_segments(&segments, tolerance)
}

/// Join segments that share endpoints (within `tolerance`) into polylines.
///
/// Open chains are walked first, starting from endpoints that do not have
/// exactly two neighbours; whatever remains forms closed loops.
#[must_use]
pub fn chain_segments(segments: &[(Point3<f64>, Point3<f64>)], tolerance: f64) -> Vec<Polyline> {
    let mut nodes: Vec<Point3<f64>> = Vec::new();
    let mut lookup: HashMap<[i64; 3], usize> = HashMap::new();
    let mut node_id = |p: &Point3<f64>| -> usize {
        let key = quantize(p, tolerance);
        *lookup.entry(key).or_insert_with(|| {
            nodes.push(*p);
            nodes.len() - 1
        })
    };

    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    for (p, q) in segments {
        let (i, j) = (node_id(p), node_id(q));
        if i != j {
            edges.insert((i.min(j), i.max(j)));
        }
    }

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut ordered: Vec<(usize, usize)> = edges.into_iter().collect();
    ordered.sort_unstable();
    for &(i, j) in &ordered {
        neighbours[i].push(j);
        neighbours[j].push(i);
    }

    let mut used: HashSet<(usize, usize)> = HashSet::with_capacity(ordered.len());
    let mut curves = Vec::new();

    let starts: Vec<usize> = (0..nodes.len())
        .filter(|&n| neighbours[n].len() != 2)
        .chain(0..nodes.len())
        .collect();
    for start in starts {
        while let Some(chain) = walk(start, &neighbours, &mut used) {
            curves.push(Polyline::new(chain.into_iter().map(|n| nodes[n]).collect()));
        }
    }
    curves
}

fn walk(
    start: usize,
    neighbours: &[Vec<usize>],
    used: &mut HashSet<(usize, usize)>,
) -> Option<Vec<usize>> {
    let mut chain = vec![start];
    let mut current = start;
    loop {
        let next = neighbours[current]
            .iter()
            .copied()
            .find(|&n| !used.contains(&(current.min(n), current.max(n))));
        let Some(next) = next else {
            break;
        };
        used.insert((current.min(next), current.max(next)));
        chain.push(next);
        if next == start {
            break;
        }
        current = next;
    }
    (chain.len() > 1).then_some(chain)
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(p: &Point3<f64>, tolerance: f64) -> [i64; 3] {
    let cell = tolerance.max(f64::EPSILON);
    [
        (p.x / cell).round() as i64,
        (p.y / cell).round() as i64,
        (p.z / cell).round() as i64,
    ]
}
