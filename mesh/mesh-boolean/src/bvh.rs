//! Bounding volume hierarchy over mesh triangles.
//!
//! Turns "which triangles could touch this box" from a scan of every face
//! into a tree walk, which keeps curve/mesh and mesh/mesh intersection
//! tractable on dense lattice meshes.

use mesh_types::{Aabb, IndexedMesh, Point3};
use smallvec::SmallVec;

/// Subtrees with at least this many triangles are built on the rayon pool.
const PARALLEL_BUILD_THRESHOLD: usize = 4096;

/// BVH node containing either leaf triangles or child nodes.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Bounding box of all triangles in this leaf.
        bbox: Aabb,
        /// Triangle indices stored in this leaf.
        triangles: SmallVec<[u32; 8]>,
    },
    /// Internal node with two children.
    Internal {
        /// Bounding box of all triangles in this subtree.
        bbox: Aabb,
        /// Left child node.
        left: Box<Self>,
        /// Right child node.
        right: Box<Self>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Bounding volume hierarchy for a triangle mesh.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, Aabb, Point3};
/// use mesh_boolean::Bvh;
///
/// let bvh = Bvh::build(&unit_cube(), 4, false);
/// assert_eq!(bvh.triangle_count(), 12);
///
/// // Only the two triangles of the -z face touch this slab.
/// let slab = Aabb::new(Point3::new(0.2, 0.2, -0.1), Point3::new(0.8, 0.8, 0.1));
/// assert_eq!(bvh.query(&slab, 0.0).len(), 2);
/// ```
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangle_count: usize,
}

impl Bvh {
    /// Build over every face of `mesh`.
    ///
    /// Faces with out-of-range indices are left out of the tree.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(mesh: &IndexedMesh, max_leaf_size: usize, parallel: bool) -> Self {
        let n = mesh.vertices.len();
        let triangles: Vec<(u32, Aabb)> = mesh
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| face.iter().all(|&i| (i as usize) < n))
            .map(|(i, face)| {
                let bbox = Aabb::from_points(face.iter().map(|&v| &mesh.vertices[v as usize].position));
                (i as u32, bbox)
            })
            .collect();

        if triangles.is_empty() {
            return Self {
                root: None,
                triangle_count: 0,
            };
        }

        let indices: Vec<usize> = (0..triangles.len()).collect();
        let threshold = if parallel {
            PARALLEL_BUILD_THRESHOLD
        } else {
            usize::MAX
        };
        let root = build_recursive(&triangles, indices, max_leaf_size.max(1), threshold);

        Self {
            root: Some(root),
            triangle_count: triangles.len(),
        }
    }

    /// Indices of triangles whose boxes touch `query_bbox` grown by `tolerance`.
    #[must_use]
    pub fn query(&self, query_bbox: &Aabb, tolerance: f64) -> Vec<u32> {
        let mut result = Vec::new();
        if let Some(root) = &self.root {
            query_recursive(root, &query_bbox.expanded(tolerance), &mut result);
        }
        result
    }

    /// Triangles whose boxes touch the segment's box grown by `tolerance`.
    #[must_use]
    pub fn query_segment(&self, a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> Vec<u32> {
        self.query(&Aabb::new(*a, *b), tolerance)
    }

    /// Number of triangles in the tree.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Check for an empty tree.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounding box of everything in the tree.
    #[must_use]
    pub fn root_bbox(&self) -> Option<&Aabb> {
        self.root.as_ref().map(BvhNode::bbox)
    }

    /// Depth of the deepest leaf; zero for a single leaf or an empty tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(node: &BvhNode) -> usize {
            match node {
                BvhNode::Leaf { .. } => 0,
                BvhNode::Internal { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

fn build_recursive(
    triangles: &[(u32, Aabb)],
    mut indices: Vec<usize>,
    max_leaf_size: usize,
    parallel_threshold: usize,
) -> BvhNode {
    let bbox = indices
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&triangles[i].1));

    if indices.len() <= max_leaf_size {
        return BvhNode::Leaf {
            bbox,
            triangles: indices.iter().map(|&i| triangles[i].0).collect(),
        };
    }

    // Median split along the longest axis.
    let size = bbox.size();
    let axis = if size.x >= size.y && size.x >= size.z {
        0
    } else if size.y >= size.z {
        1
    } else {
        2
    };
    indices.sort_by(|&a, &b| {
        triangles[a].1.center()[axis].total_cmp(&triangles[b].1.center()[axis])
    });
    let right_indices = indices.split_off(indices.len() / 2);
    let left_indices = indices;

    let (left, right) = if left_indices.len() + right_indices.len() >= parallel_threshold {
        rayon::join(
            || build_recursive(triangles, left_indices, max_leaf_size, parallel_threshold),
            || build_recursive(triangles, right_indices, max_leaf_size, parallel_threshold),
        )
    } else {
        (
            build_recursive(triangles, left_indices, max_leaf_size, parallel_threshold),
            build_recursive(triangles, right_indices, max_leaf_size, parallel_threshold),
        )
    };

    BvhNode::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn query_recursive(node: &BvhNode, query_bbox: &Aabb, result: &mut Vec<u32>) {
    if !node.bbox().intersects(query_bbox) {
        return;
    }
    match node {
        BvhNode::Leaf { triangles, .. } => result.extend(triangles.iter().copied()),
        BvhNode::Internal { left, right, .. } => {
            query_recursive(left, query_bbox, result);
            query_recursive(right, query_bbox, result);
        }
    }
}
