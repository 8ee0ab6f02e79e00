//! Surface extraction from a sampled field.
//!
//! Surface nets place one vertex in every grid cell the surface passes
//! through and join the four cells around each crossed grid edge with a
//! quad. On a closed level set the quads form a closed surface.

use crate::grid::ScalarGrid;
use mesh_types::{Face, PolyMesh, Point3, Vector3, Vertex};

/// Extract the `iso` level set of `grid` as outward-facing quads.
///
/// Samples below `iso` are inside. The surface must stay clear of the
/// outermost grid points to come out closed.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#[must_use]
pub fn surface_nets(grid: &ScalarGrid, iso: f64) -> PolyMesh {
    let dims = grid.dims();
    if dims.iter().any(|&n| n < 2) {
        return PolyMesh::new();
    }
    let cells = [dims[0] - 1, dims[1] - 1, dims[2] - 1];
    let cell_index = |[i, j, k]: [usize; 3]| i + cells[0] * (j + cells[1] * k);

    let mut cell_vertex = vec![u32::MAX; cells[0] * cells[1] * cells[2]];
    let mut vertices = Vec::new();

    for k in 0..cells[2] {
        for j in 0..cells[1] {
            for i in 0..cells[0] {
                let corner = |c: usize| [i + (c & 1), j + ((c >> 1) & 1), k + ((c >> 2) & 1)];
                let values: [f64; 8] = std::array::from_fn(|c| grid.value(corner(c)));
                let inside = values.iter().filter(|&&v| v < iso).count();
                if inside == 0 || inside == 8 {
                    continue;
                }

                let mut sum = Vector3::zeros();
                let mut crossings = 0usize;
                for c in 0..8 {
                    for bit in [1, 2, 4] {
                        if c & bit != 0 {
                            continue;
                        }
                        let (va, vb) = (values[c], values[c | bit]);
                        if (va < iso) == (vb < iso) {
                            continue;
                        }
                        let t = (iso - va) / (vb - va);
                        let pa = grid.position(corner(c));
                        let pb = grid.position(corner(c | bit));
                        sum += (pa + (pb - pa) * t).coords;
                        crossings += 1;
                    }
                }

                cell_vertex[cell_index([i, j, k])] = vertices.len() as u32;
                vertices.push(Vertex::new(Point3::from(sum / crossings as f64)));
            }
        }
    }

    let mut faces = Vec::new();
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                let p = [i, j, k];
                for axis in 0..3 {
                    if let Some(face) = edge_quad(grid, iso, p, axis, &cell_vertex, &cell_index) {
                        faces.push(face);
                    }
                }
            }
        }
    }

    PolyMesh::from_parts(vertices, faces)
}

/// Quad around the grid edge from `p` along `axis`, if the edge crosses
/// the surface and all four neighbouring cells exist.
fn edge_quad(
    grid: &ScalarGrid,
    iso: f64,
    p: [usize; 3],
    axis: usize,
    cell_vertex: &[u32],
    cell_index: &impl Fn([usize; 3]) -> usize,
) -> Option<Face> {
    let dims = grid.dims();
    let (b, c) = ((axis + 1) % 3, (axis + 2) % 3);
    if p[axis] + 1 >= dims[axis] || p[b] == 0 || p[c] == 0 || p[b] + 1 >= dims[b] || p[c] + 1 >= dims[c] {
        return None;
    }

    let mut q = p;
    q[axis] += 1;
    let start_inside = grid.value(p) < iso;
    if start_inside == (grid.value(q) < iso) {
        return None;
    }

    let around = |db: usize, dc: usize| {
        let mut cell = p;
        cell[b] = p[b] - 1 + db;
        cell[c] = p[c] - 1 + dc;
        cell_vertex[cell_index(cell)]
    };
    let quad = [around(0, 0), around(1, 0), around(1, 1), around(0, 1)];
    if quad.contains(&u32::MAX) {
        return None;
    }

    // The quad's winding faces +axis; outward is toward the outside sample.
    let face = Face::Quad(quad);
    Some(if start_inside { face } else { face.reversed() })
}
