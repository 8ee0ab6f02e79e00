//! Low-level geometric queries.
//!
//! Closest points on triangles and segments, ray tests against triangles
//! and boxes. Everything here is allocation free and works on plain points.

use mesh_types::Aabb;
use nalgebra::{Point3, Vector3};

/// Rays closer to parallel than this are treated as missing the triangle.
const PARALLEL_EPSILON: f64 = 1e-10;

/// Closest point on triangle `v0 v1 v2` to `point`.
///
/// Region classification from Ericson, "Real-Time Collision Detection".
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    let ab = v1 - v0;
    let ac = v2 - v0;

    let ap = point - v0;
    let (d1, d2) = (ab.dot(&ap), ac.dot(&ap));
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = point - v1;
    let (d3, d4) = (ab.dot(&bp), ac.dot(&bp));
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    let vc = d1.mul_add(d4, -(d3 * d2));
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return v0 + ab * (d1 / (d1 - d3));
    }

    let cp = point - v2;
    let (d5, d6) = (ab.dot(&cp), ac.dot(&cp));
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    let vb = d5.mul_add(d2, -(d1 * d6));
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return v0 + ac * (d2 / (d2 - d6));
    }

    let va = d3.mul_add(d6, -(d5 * d4));
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return v1 + (v2 - v1) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    v0 + ab * (vb * denom) + ac * (vc * denom)
}

/// Ray/triangle intersection (Möller–Trumbore).
///
/// Returns the ray parameter of the hit, strictly in front of the origin.
#[must_use]
pub fn ray_triangle_intersect(
    ray_origin: Point3<f64>,
    ray_dir: Vector3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray_dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray_dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > PARALLEL_EPSILON).then_some(t)
}

/// Slab test: does the ray starting at `origin` with component-wise
/// reciprocal direction `inv_dir` touch the box?
#[must_use]
pub fn ray_hits_aabb(origin: &Point3<f64>, inv_dir: &Vector3<f64>, aabb: &Aabb) -> bool {
    let mut t_min = 0.0_f64;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        let t1 = (aabb.min[axis] - origin[axis]) * inv_dir[axis];
        let t2 = (aabb.max[axis] - origin[axis]) * inv_dir[axis];
        // NaN from 0 * inf means the origin sits on the slab; keep the range.
        if t1.is_nan() || t2.is_nan() {
            continue;
        }
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }
    t_min <= t_max
}

/// Squared distance from a point to a box; zero inside.
#[must_use]
pub fn aabb_distance_squared(point: &Point3<f64>, aabb: &Aabb) -> f64 {
    (0..3)
        .map(|axis| {
            let d = (aabb.min[axis] - point[axis])
                .max(point[axis] - aabb.max[axis])
                .max(0.0);
            d * d
        })
        .sum()
}

/// Squared distance from `point` to segment `a b`.
#[must_use]
pub fn point_segment_distance_squared(point: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> f64 {
    let ab = b - a;
    let t = ((point - a).dot(&ab) / ab.norm_squared().max(f64::EPSILON)).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simple_triangle() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    #[test]
    fn closest_point_in_face_region() {
        let (v0, v1, v2) = simple_triangle();
        let closest = closest_point_on_triangle(Point3::new(5.0, 3.0, 5.0), v0, v1, v2);
        assert_relative_eq!(closest, Point3::new(5.0, 3.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn closest_point_in_vertex_and_edge_regions() {
        let (v0, v1, v2) = simple_triangle();
        let corner = closest_point_on_triangle(Point3::new(-5.0, -5.0, 0.0), v0, v1, v2);
        assert_relative_eq!(corner, v0, epsilon = 1e-10);

        let edge = closest_point_on_triangle(Point3::new(5.0, -5.0, 0.0), v0, v1, v2);
        assert_relative_eq!(edge, Point3::new(5.0, 0.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn ray_hits_and_misses() {
        let (v0, v1, v2) = simple_triangle();
        let down = Vector3::new(0.0, 0.0, -1.0);
        let hit = ray_triangle_intersect(Point3::new(5.0, 3.0, 5.0), down, v0, v1, v2);
        assert_relative_eq!(hit.unwrap_or(f64::NAN), 5.0, epsilon = 1e-10);

        assert!(ray_triangle_intersect(Point3::new(100.0, 100.0, 5.0), down, v0, v1, v2).is_none());
        // Parallel.
        assert!(
            ray_triangle_intersect(Point3::new(5.0, 3.0, 5.0), Vector3::x(), v0, v1, v2).is_none()
        );
        // Behind the origin.
        assert!(ray_triangle_intersect(Point3::new(5.0, 3.0, -5.0), down, v0, v1, v2).is_none());
    }

    #[test]
    fn slab_test() {
        let aabb = Aabb::new(Point3::new(1.0, -1.0, -1.0), Point3::new(2.0, 1.0, 1.0));
        let inv = |d: Vector3<f64>| d.map(|c| 1.0 / c);
        assert!(ray_hits_aabb(&Point3::origin(), &inv(Vector3::x()), &aabb));
        assert!(!ray_hits_aabb(&Point3::origin(), &inv(-Vector3::x()), &aabb));
        assert!(!ray_hits_aabb(&Point3::new(0.0, 5.0, 0.0), &inv(Vector3::x()), &aabb));
    }

    #[test]
    fn box_distance() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(aabb_distance_squared(&Point3::new(0.5, 0.5, 0.5), &aabb), 0.0);
        assert_relative_eq!(aabb_distance_squared(&Point3::new(3.0, 0.5, 2.0), &aabb), 5.0);
    }

    #[test]
    fn segment_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        assert_relative_eq!(point_segment_distance_squared(Point3::new(5.0, 5.0, 0.0), a, b), 25.0);
        assert_relative_eq!(point_segment_distance_squared(Point3::new(-5.0, 0.0, 0.0), a, b), 25.0);
        // Zero-length segment degrades to a point.
        assert_relative_eq!(point_segment_distance_squared(Point3::new(0.0, 3.0, 4.0), a, a), 25.0);
    }
}
