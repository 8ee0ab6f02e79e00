//! Output sinks for lattice artifacts.
//!
//! - **Export** - binary or ASCII STL, optionally releasing the mesh once written
//! - **Log** - mesh reports as ordered JSON records, combined and appended to a
//!   comma-separated log file
//! - **Metadata** - part identity, environment and artifact paths
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{append_record, combine_reports, export_stl, report_record, ArtifactMetadata,
//!     ExportOptions};
//! use mesh_repair::{validate_mesh, ORIGINAL_REPORT};
//! use mesh_types::unit_cube;
//!
//! let meta = ArtifactMetadata::new("221014-3fa-9c", "2022-10-14T09:00:00", "millimeter")
//!     .with_save_dir("out");
//! let paths = meta.paths.clone().unwrap();
//!
//! let mesh = unit_cube();
//! let report = validate_mesh(ORIGINAL_REPORT, &mesh);
//! export_stl(mesh, paths.mesh_base(), &ExportOptions::default()).unwrap();
//!
//! let records = [
//!     meta.to_record().unwrap().to_string(),
//!     report_record(&report).unwrap().to_string(),
//! ];
//! append_record(&paths.log, &combine_reports(&records).unwrap()).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod export;
mod log;
mod metadata;
mod stl;

pub use error::{IoError, IoResult};
pub use export::{ExportOptions, Exported, export_stl, stl_path};
pub use log::{append_record, combine_reports, merge_records, report_record, to_pretty_json};
pub use metadata::{ArtifactMetadata, ArtifactPaths, Library, SoftwareVersion};
pub use stl::{StlFormat, load_stl, save_stl, write_stl};
