//! Report records and the append-only log file.
//!
//! A log file is a comma-separated sequence of JSON records. Each pipeline
//! run appends one combined record, so the file is not itself a JSON
//! document until wrapped in brackets.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use mesh_repair::MeshReport;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{IoError, IoResult};

const RECORD_SEPARATOR: &str = ",\n";
const INDENT: &[u8] = b"    ";

/// A report as a single-key record `{ "<version>": { ...entries } }`.
///
/// # Errors
///
/// Returns [`IoError::Json`] if a value cannot be represented in JSON.
pub fn report_record(report: &MeshReport) -> IoResult<Value> {
    let mut record = Map::new();
    record.insert(report.version.clone(), serde_json::to_value(report)?);
    Ok(Value::Object(record))
}

/// Merge JSON objects in order.
///
/// Later keys replace earlier values but keep the position where the key
/// first appeared.
///
/// # Errors
///
/// Returns [`IoError::NotAnObject`] for any record that is not an object.
pub fn merge_records<I>(records: I) -> IoResult<Map<String, Value>>
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Map::new();
    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(IoError::NotAnObject { index });
        };
        for (key, value) in fields {
            merged.insert(key, value);
        }
    }
    Ok(merged)
}

/// Pretty-print a JSON value with four-space indentation.
///
/// # Errors
///
/// Returns [`IoError::Json`] if serialization fails.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> IoResult<String> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| IoError::invalid_content(e.to_string()))
}

/// Combine JSON text records into one pretty-printed object.
///
/// Blank inputs are skipped. Indices in [`IoError::NotAnObject`] refer to
/// positions in `records`, blanks included.
///
/// # Errors
///
/// Returns [`IoError::Json`] for text that is not JSON and
/// [`IoError::NotAnObject`] for JSON that is not an object.
///
/// # Example
///
/// ```
/// use mesh_io::combine_reports;
///
/// let combined = combine_reports(&[r#"{"a": 1, "b": 2}"#, "", r#"{"a": 3}"#]).unwrap();
/// assert_eq!(combined, "{\n    \"a\": 3,\n    \"b\": 2\n}");
/// ```
pub fn combine_reports<S: AsRef<str>>(records: &[S]) -> IoResult<String> {
    let mut merged = Map::new();
    for (index, text) in records.iter().enumerate() {
        let text = text.as_ref();
        if text.trim().is_empty() {
            continue;
        }
        let Value::Object(fields) = serde_json::from_str::<Value>(text)? else {
            return Err(IoError::NotAnObject { index });
        };
        merged.extend(fields);
    }
    to_pretty_json(&merged)
}

/// Append `content` to a comma-separated log file.
///
/// A non-empty existing file gets `",\n"` before the content; an empty one
/// gets the content alone; a missing file is created.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or written.
pub fn append_record(path: impl AsRef<Path>, content: &str) -> IoResult<()> {
    let path = path.as_ref();
    let existing_len = match fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if existing_len.is_some_and(|len| len > 0) {
        file.write_all(RECORD_SEPARATOR.as_bytes())?;
    }
    file.write_all(content.as_bytes())?;
    file.flush()?;

    debug!(
        path = %path.display(),
        created = existing_len.is_none(),
        bytes = content.len(),
        "appended log record"
    );
    Ok(())
}
