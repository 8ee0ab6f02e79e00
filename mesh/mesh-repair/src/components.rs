//! Connected component analysis.
//!
//! Two faces belong to the same component when they share a vertex, which
//! is how disjoint pieces are counted in mesh reports.

use hashbrown::HashMap;

/// Disjoint-set forest over vertex indices.
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    #[allow(clippy::cast_possible_truncation)]
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb) as usize] = ra.min(rb);
        }
    }
}

/// Group face indices into vertex-connected components.
///
/// Components are ordered by their lowest face index. Faces with an
/// out-of-range index are ignored.
///
/// # Example
///
/// ```
/// use mesh_repair::face_components;
///
/// let faces = vec![[0, 1, 2], [2, 3, 4], [5, 6, 7]];
/// let parts = face_components(&faces, 8);
/// assert_eq!(parts, vec![vec![0, 1], vec![2]]);
/// ```
#[must_use]
pub fn face_components<F: AsRef<[u32]>>(faces: &[F], vertex_count: usize) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::new(vertex_count);
    let in_range = |f: &F| f.as_ref().iter().all(|&i| (i as usize) < vertex_count);

    for face in faces.iter().filter(|f| in_range(f)) {
        let idx = face.as_ref();
        for pair in idx.windows(2) {
            sets.union(pair[0], pair[1]);
        }
    }

    let mut slot: HashMap<u32, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for (face_idx, face) in faces.iter().enumerate() {
        let Some(&first) = face.as_ref().first() else {
            continue;
        };
        if !in_range(face) {
            continue;
        }
        let root = sets.find(first);
        let next = components.len();
        let k = *slot.entry(root).or_insert(next);
        if k == next {
            components.push(Vec::new());
        }
        components[k].push(face_idx);
    }
    components
}

/// Number of vertex-connected pieces.
#[must_use]
pub fn disjoint_count<F: AsRef<[u32]>>(faces: &[F], vertex_count: usize) -> usize {
    face_components(faces, vertex_count).len()
}
