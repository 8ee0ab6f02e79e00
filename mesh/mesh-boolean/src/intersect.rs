//! Segment/triangle and triangle/triangle intersection primitives.

// Barycentric determinant terms are grouped on purpose.
#![allow(clippy::suspicious_operation_groupings)]

use mesh_types::{IndexedMesh, Point3, Triangle, Vector3};

/// Where a segment crosses a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Fraction along the segment, `0.0` at the start and `1.0` at the end.
    pub t: f64,
    /// The crossing point.
    pub point: Point3<f64>,
}

/// Möller-Trumbore test of the segment `a -> b` against `triangle`.
///
/// Hits within `epsilon` of either end are clamped onto the segment.
/// Segments lying in the triangle's plane report no hit.
#[must_use]
pub fn segment_triangle_intersect(
    a: &Point3<f64>,
    b: &Point3<f64>,
    triangle: &Triangle,
    epsilon: f64,
) -> Option<SegmentHit> {
    let direction = b - a;
    let length_sq = direction.norm_squared();
    if length_sq < epsilon * epsilon {
        return None;
    }

    let edge1 = triangle.v1 - triangle.v0;
    let edge2 = triangle.v2 - triangle.v0;
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);

    // Scale the parallel test by the sizes involved so it is unit-independent.
    if det.abs() <= f64::EPSILON * length_sq.sqrt() * edge1.norm() * edge2.norm() {
        return None;
    }

    let f = 1.0 / det;
    let s = a - triangle.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    let slack = epsilon / length_sq.sqrt();
    if t < -slack || t > 1.0 + slack {
        return None;
    }

    let t = t.clamp(0.0, 1.0);
    Some(SegmentHit {
        t,
        point: a + direction * t,
    })
}

/// Segment along which two triangles cross, if they do.
///
/// Collects the crossings of each triangle's edges with the other triangle
/// and returns the two that lie furthest apart.
#[must_use]
pub fn triangle_triangle_segment(
    first: &Triangle,
    second: &Triangle,
    epsilon: f64,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(6);
    for (tri, other) in [(first, second), (second, first)] {
        let [p0, p1, p2] = tri.vertices();
        for (a, b) in [(p0, p1), (p1, p2), (p2, p0)] {
            if let Some(hit) = segment_triangle_intersect(&a, &b, other, epsilon) {
                let duplicate = points
                    .iter()
                    .any(|q| (hit.point - q).norm_squared() <= epsilon * epsilon);
                if !duplicate {
                    points.push(hit.point);
                }
            }
        }
    }

    if points.len() < 2 {
        return None;
    }

    let mut best = (0, 1, (points[1] - points[0]).norm_squared());
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d = (points[j] - points[i]).norm_squared();
            if d > best.2 {
                best = (i, j, d);
            }
        }
    }
    Some((points[best.0], points[best.1]))
}

/// An oriented plane with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3<f64>,
    /// Unit normal; the side it points into is the positive side.
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Plane through `origin` with the direction of `normal`.
    ///
    /// Returns `None` when `normal` has no usable direction.
    #[must_use]
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let len = normal.norm();
        (len > f64::MIN_POSITIVE && len.is_finite()).then(|| Self {
            origin,
            normal: normal / len,
        })
    }

    /// Best-fit plane of a sheet: area-weighted normal through the
    /// area-weighted centroid.
    ///
    /// Returns `None` for a sheet with no area, or one whose face normals
    /// cancel out.
    #[must_use]
    pub fn fit(mesh: &IndexedMesh) -> Option<Self> {
        let mut normal = Vector3::zeros();
        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;
        for tri in mesh.triangles() {
            let n = tri.normal_unnormalized();
            let area = n.norm() * 0.5;
            normal += n;
            weighted += tri.centroid().coords * area;
            total_area += area;
        }
        // normals of a closed or folded sheet cancel out
        if total_area <= 0.0 || normal.norm() <= 1e-9 * total_area {
            return None;
        }
        Self::new(Point3::from(weighted / total_area), normal)
    }

    /// Signed distance; positive on the side the normal points into.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Same plane moved `distance` along its normal.
    #[must_use]
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            normal: self.normal,
        }
    }
}
