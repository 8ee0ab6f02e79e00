//! Provenance attached to exported artifacts.
//!
//! The core never interprets these values; they are labels carried into
//! the log next to the mesh reports.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::IoResult;

/// Output locations for one part: `<dir>/<part_id>.stl` and
/// `<dir>/<part_id>.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Mesh file.
    #[serde(rename = "mesh_path")]
    pub mesh: PathBuf,
    /// Log file.
    #[serde(rename = "log_path")]
    pub log: PathBuf,
}

impl ArtifactPaths {
    /// Derive both paths from a directory and part identifier.
    ///
    /// ```
    /// use mesh_io::ArtifactPaths;
    /// use std::path::Path;
    ///
    /// let paths = ArtifactPaths::new("out", "221014-3fa-9c");
    /// assert_eq!(paths.mesh, Path::new("out/221014-3fa-9c.stl"));
    /// assert_eq!(paths.log, Path::new("out/221014-3fa-9c.txt"));
    /// ```
    #[must_use]
    pub fn new(save_dir: impl AsRef<Path>, part_id: &str) -> Self {
        let base = save_dir.as_ref().join(part_id);
        let with = |ext: &str| {
            let mut name = base.as_os_str().to_os_string();
            name.push(ext);
            PathBuf::from(name)
        };
        Self {
            mesh: with(".stl"),
            log: with(".txt"),
        }
    }

    /// The mesh path without its extension, as taken by
    /// [`export_stl`](crate::export_stl).
    #[must_use]
    pub fn mesh_base(&self) -> PathBuf {
        self.mesh.with_extension("")
    }
}

/// Build and release date of a host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftwareVersion {
    /// Application name.
    pub name: String,
    /// Build string.
    pub build: String,
    /// Release date.
    pub date: String,
}

/// A named, versioned library in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    /// Library name.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl Library {
    /// Create a library entry.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

impl Serialize for Library {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identity and environment of one generated part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMetadata {
    /// Caller-supplied unique identifier.
    pub part_id: String,
    /// UTC timestamp of the computation, e.g. `2022-01-24T10:31:05`.
    pub date_utc: String,
    /// Where the artifacts are written.
    #[serde(flatten)]
    pub paths: Option<ArtifactPaths>,
    /// Definition that produced the part, relative to the project directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Document length unit, e.g. `millimeter`.
    pub base_unit: String,
    /// Device identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Host application versions.
    pub host_versions: Vec<SoftwareVersion>,
    /// Built-in libraries, rendered as `"Name Version"`.
    #[serde(rename = "core_dependencies")]
    pub core_libraries: Vec<Library>,
    /// Add-on libraries, rendered as `"Name Version"`.
    #[serde(rename = "addon_dependencies")]
    pub addon_libraries: Vec<Library>,
}

impl ArtifactMetadata {
    /// Metadata with an identifier, timestamp and unit; everything else empty.
    #[must_use]
    pub fn new(
        part_id: impl Into<String>,
        date_utc: impl Into<String>,
        base_unit: impl Into<String>,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            date_utc: date_utc.into(),
            paths: None,
            definition: None,
            base_unit: base_unit.into(),
            device: None,
            host_versions: Vec::new(),
            core_libraries: Vec::new(),
            addon_libraries: Vec::new(),
        }
    }

    /// Derive artifact paths from `save_dir` and the part id.
    #[must_use]
    pub fn with_save_dir(mut self, save_dir: impl AsRef<Path>) -> Self {
        self.paths = Some(ArtifactPaths::new(save_dir, &self.part_id));
        self
    }

    /// Record the producing definition, relative to `project_dir` when it
    /// lies inside it.
    #[must_use]
    pub fn with_definition(mut self, definition: &Path, project_dir: Option<&Path>) -> Self {
        let shown = project_dir
            .and_then(|dir| definition.strip_prefix(dir).ok())
            .unwrap_or(definition);
        self.definition = Some(shown.display().to_string());
        self
    }

    /// Record the device identifier.
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Add a host application version.
    #[must_use]
    pub fn with_host_version(mut self, version: SoftwareVersion) -> Self {
        self.host_versions.push(version);
        self
    }

    /// Add a library, sorted into core or add-on.
    #[must_use]
    pub fn with_library(mut self, library: Library, core: bool) -> Self {
        let list = if core {
            &mut self.core_libraries
        } else {
            &mut self.addon_libraries
        };
        if !list.contains(&library) {
            list.push(library);
        }
        self
    }

    /// The metadata as a flat JSON record, ready for
    /// [`merge_records`](crate::merge_records).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`](crate::IoError::Json) if serialization fails.
    pub fn to_record(&self) -> IoResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
