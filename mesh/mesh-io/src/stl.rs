//! STL (stereolithography) encoding.
//!
//! # Binary Layout
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Unit normal
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (0)
//! end
//! ```
//!
//! The ASCII form writes the same facets as `facet normal` / `outer loop`
//! blocks inside `solid` ... `endsolid`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Point3, Vector3, Vertex};
use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;
const HEADER_TEXT: &[u8] = b"binary STL, lattice mesh export";

/// STL flavour to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlFormat {
    /// Compact little-endian binary.
    #[default]
    Binary,
    /// Human-readable text.
    Ascii,
}

/// Encode `mesh` as STL into `writer`.
///
/// # Errors
///
/// Returns [`IoError::InvalidIndex`] for faces that refer to missing
/// vertices, and I/O errors from the writer.
pub fn write_stl<W: Write>(mesh: &IndexedMesh, writer: W, format: StlFormat) -> IoResult<()> {
    let n = mesh.vertices.len();
    for (face, indices) in mesh.faces.iter().enumerate() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= n) {
            return Err(IoError::InvalidIndex {
                face,
                index,
                vertex_count: n,
            });
        }
    }
    match format {
        StlFormat::Binary => write_binary(mesh, writer),
        StlFormat::Ascii => write_ascii(mesh, writer),
    }
}

/// Write `mesh` to an STL file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written, or if the
/// mesh has out-of-range face indices.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{save_stl, StlFormat};
/// use mesh_types::unit_cube;
///
/// save_stl(&unit_cube(), "cube.stl", StlFormat::Binary).unwrap();
/// ```
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, format: StlFormat) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_stl(mesh, &mut writer, format)?;
    writer.flush()?;
    Ok(())
}

fn facets(mesh: &IndexedMesh) -> impl Iterator<Item = (Vector3<f64>, [Point3<f64>; 3])> + '_ {
    mesh.faces.iter().map(|f| {
        let p = f.map(|i| mesh.vertices[i as usize].position);
        let normal = (p[1] - p[0])
            .cross(&(p[2] - p[0]))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        (normal, p)
    })
}

#[allow(clippy::cast_possible_truncation)]
fn write_binary<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    let mut header = [b' '; HEADER_SIZE];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;
    let count = u32::try_from(mesh.faces.len())
        .map_err(|_| IoError::invalid_content("too many faces for binary STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = [0u8; TRIANGLE_SIZE];
    for (normal, points) in facets(mesh) {
        let values = std::iter::once(normal)
            .chain(points.iter().map(|p| p.coords))
            .flat_map(|v| [v.x, v.y, v.z]);
        for (slot, value) in record.chunks_exact_mut(4).zip(values) {
            slot.copy_from_slice(&(value as f32).to_le_bytes());
        }
        // last two bytes are the attribute count
        record[48..].fill(0);
        writer.write_all(&record)?;
    }
    Ok(())
}

fn write_ascii<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    writeln!(writer, "solid lattice")?;
    for (n, points) in facets(mesh) {
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for p in &points {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid lattice")?;
    Ok(())
}

/// Read an STL file written in either flavour.
///
/// Vertices are not shared between facets; three are created per facet.
/// The flavour is decided by size: a file whose length matches the binary
/// layout for its stated triangle count is binary.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for a missing file and
/// [`IoError::InvalidContent`] for content that is neither flavour.
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IoError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                IoError::Io(e)
            }
        })?
        .read_to_end(&mut bytes)?;

    if is_binary(&bytes) {
        Ok(read_binary(&bytes))
    } else {
        read_ascii(BufReader::new(bytes.as_slice()))
    }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_SIZE + 4 && {
        let mut count = [0u8; 4];
        count.copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + 4]);
        let expected = HEADER_SIZE + 4 + u32::from_le_bytes(count) as usize * TRIANGLE_SIZE;
        bytes.len() == expected
    }
}

#[allow(clippy::cast_possible_truncation)]
fn read_binary(bytes: &[u8]) -> IndexedMesh {
    let mut mesh = IndexedMesh::new();
    for record in bytes[HEADER_SIZE + 4..].chunks_exact(TRIANGLE_SIZE) {
        let base = mesh.vertices.len() as u32;
        for corner in record[12..48].chunks_exact(12) {
            let f = |i: usize| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&corner[i * 4..i * 4 + 4]);
                f64::from(f32::from_le_bytes(raw))
            };
            mesh.vertices.push(Vertex::from_coords(f(0), f(1), f(2)));
        }
        mesh.faces.push([base, base + 1, base + 2]);
    }
    mesh
}

#[allow(clippy::cast_possible_truncation)]
fn read_ascii<R: BufRead>(reader: R) -> IoResult<IndexedMesh> {
    let mut mesh = IndexedMesh::new();
    let mut corners: Vec<Vertex> = Vec::with_capacity(3);
    let mut saw_solid = false;

    for line in reader.lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match words.next() {
            Some("solid") => saw_solid = true,
            Some("vertex") => {
                let mut coord = || -> IoResult<f64> {
                    words
                        .next()
                        .ok_or_else(|| IoError::invalid_content("vertex needs three coordinates"))?
                        .parse::<f64>()
                        .map_err(|e| IoError::invalid_content(format!("bad coordinate: {e}")))
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                corners.push(Vertex::from_coords(x, y, z));
            }
            Some("endfacet") => {
                if corners.len() != 3 {
                    return Err(IoError::invalid_content(format!(
                        "facet has {} vertices",
                        corners.len()
                    )));
                }
                let base = mesh.vertices.len() as u32;
                mesh.vertices.append(&mut corners);
                mesh.faces.push([base, base + 1, base + 2]);
            }
            Some("endsolid") => break,
            _ => {}
        }
    }

    if saw_solid {
        Ok(mesh)
    } else {
        Err(IoError::invalid_content("not an STL file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::unit_cube;

    #[test]
    fn binary_size_matches_layout() {
        let mut bytes = Vec::new();
        write_stl(&unit_cube(), &mut bytes, StlFormat::Binary).unwrap();
        assert_eq!(bytes.len(), 84 + 12 * 50);
        assert!(is_binary(&bytes));
        assert_eq!(read_binary(&bytes).face_count(), 12);
    }

    #[test]
    fn ascii_lists_every_facet() {
        let mut bytes = Vec::new();
        write_stl(&unit_cube(), &mut bytes, StlFormat::Ascii).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("solid lattice"));
        assert_eq!(text.matches("endfacet").count(), 12);
    }

    #[test]
    fn saved_cube_keeps_volume() {
        let dir = tempfile::tempdir().unwrap();
        for format in [StlFormat::Binary, StlFormat::Ascii] {
            let path = dir.path().join(format!("{format:?}.stl"));
            save_stl(&unit_cube(), &path, format).unwrap();
            let loaded = load_stl(&path).unwrap();
            assert_eq!(loaded.face_count(), 12);
            assert_relative_eq!(loaded.signed_volume(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn bad_index_is_rejected() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 42]);
        let err = write_stl(&mesh, Vec::new(), StlFormat::Binary);
        assert!(matches!(err, Err(IoError::InvalidIndex { face: 12, index: 42, .. })));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_stl(dir.path().join("nothing.stl"));
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn text_without_solid_is_rejected() {
        let result = read_ascii(BufReader::new(&b"hello\nworld\n"[..]));
        assert!(result.is_err());
    }
}
