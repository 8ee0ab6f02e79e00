//! Distance field of a thickened curve network.

use hashbrown::HashMap;
use mesh_sdf::point_segment_distance_squared;
use mesh_types::{Aabb, Point3, Polyline};

/// Signed distance to the union of capsules of one radius around a set
/// of curves: negative inside, zero on the surface.
///
/// Segments are bucketed on a coarse hash grid whose cell size equals the
/// search reach. Points further than the reach from every segment report
/// the reach itself, which is enough to get the sign right.
#[derive(Debug)]
pub struct CapsuleField {
    segments: Vec<(Point3<f64>, Point3<f64>)>,
    buckets: HashMap<[i64; 3], Vec<u32>>,
    radius: f64,
    reach: f64,
    bounds: Aabb,
}

impl CapsuleField {
    /// Capsules of `radius` around every segment of `curves`.
    ///
    /// Single-point curves become spheres. Exact distances are kept out to
    /// `reach` beyond the surface.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn new(curves: &[Polyline], radius: f64, reach: f64) -> Self {
        let mut segments = Vec::new();
        for curve in curves {
            match curve.len() {
                0 => {}
                1 => segments.extend(curve.start().map(|p| (p, p))),
                _ => segments.extend(curve.segments()),
            }
        }

        let cell = radius + reach;
        let mut buckets: HashMap<[i64; 3], Vec<u32>> = HashMap::new();
        let mut bounds = Aabb::empty();
        for (n, (a, b)) in segments.iter().enumerate() {
            let span = Aabb::new(*a, *b);
            bounds = bounds.union(&span);
            let lo = bucket_key(&span.min, cell);
            let hi = bucket_key(&span.max, cell);
            for i in lo[0] - 1..=hi[0] + 1 {
                for j in lo[1] - 1..=hi[1] + 1 {
                    for k in lo[2] - 1..=hi[2] + 1 {
                        buckets.entry([i, j, k]).or_default().push(n as u32);
                    }
                }
            }
        }

        Self {
            segments,
            buckets,
            radius,
            reach,
            bounds: bounds.expanded(radius),
        }
    }

    /// Box containing the whole thickened network.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Number of capsules.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Field value at `point`.
    #[must_use]
    pub fn value(&self, point: &Point3<f64>) -> f64 {
        let key = bucket_key(point, self.radius + self.reach);
        let Some(candidates) = self.buckets.get(&key) else {
            return self.reach;
        };
        let nearest = candidates
            .iter()
            .map(|&n| {
                let (a, b) = &self.segments[n as usize];
                point_segment_distance_squared(*point, *a, *b)
            })
            .fold(f64::INFINITY, f64::min);
        (nearest.sqrt() - self.radius).min(self.reach)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bucket_key(p: &Point3<f64>, cell: f64) -> [i64; 3] {
    [
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    ]
}
