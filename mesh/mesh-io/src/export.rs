//! Writing the finished lattice to disk.

use std::path::{Path, PathBuf};

use mesh_types::IndexedMesh;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IoResult;
use crate::stl::{StlFormat, save_stl};

/// Options for [`export_stl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// STL flavour.
    pub format: StlFormat,
    /// Drop the in-memory mesh once it has been written.
    pub remove_after_export: bool,
}

impl ExportOptions {
    /// Select the STL flavour.
    #[must_use]
    pub const fn with_format(mut self, format: StlFormat) -> Self {
        self.format = format;
        self
    }

    /// Drop the mesh after writing instead of handing it back.
    #[must_use]
    pub const fn with_remove_after_export(mut self, remove: bool) -> Self {
        self.remove_after_export = remove;
        self
    }
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct Exported {
    /// File that was written.
    pub path: PathBuf,
    /// The mesh, unless the options asked for it to be removed.
    pub mesh: Option<IndexedMesh>,
}

/// `base_name` with `.stl` appended.
///
/// The suffix is appended, not substituted, so a base name containing dots
/// keeps them.
#[must_use]
pub fn stl_path(base_name: impl AsRef<Path>) -> PathBuf {
    let mut name = base_name.as_ref().as_os_str().to_os_string();
    name.push(".stl");
    PathBuf::from(name)
}

/// Write `mesh` to `<base_name>.stl`.
///
/// With [`ExportOptions::remove_after_export`] set, the mesh is dropped
/// after the write and [`Exported::mesh`] is `None`; otherwise ownership
/// passes back to the caller.
///
/// # Errors
///
/// Returns an error if the file cannot be written. The mesh is lost in
/// that case.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{export_stl, ExportOptions};
/// use mesh_types::unit_cube;
///
/// let out = export_stl(unit_cube(), "out/part", &ExportOptions::default()).unwrap();
/// assert!(out.path.ends_with("part.stl"));
/// assert!(out.mesh.is_some());
/// ```
pub fn export_stl(
    mesh: IndexedMesh,
    base_name: impl AsRef<Path>,
    options: &ExportOptions,
) -> IoResult<Exported> {
    let path = stl_path(base_name);
    save_stl(&mesh, &path, options.format)?;
    info!(
        path = %path.display(),
        faces = mesh.face_count(),
        format = ?options.format,
        "exported mesh"
    );

    let mesh = if options.remove_after_export {
        debug!("dropping exported mesh");
        None
    } else {
        Some(mesh)
    };
    Ok(Exported { path, mesh })
}
