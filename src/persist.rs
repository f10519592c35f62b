//! JSON entry I/O shared by the config and stats stores.
//!
//! Reads are lenient: a missing, unreadable or malformed entry is reported
//! as such and the store falls back to defaults. Writes are strict and return a
//! [`PersistenceError`] so the caller can tell the user.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What was found at an entry's location.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredEntry {
    Missing,
    Corrupt,
    Object(Map<String, Value>),
}

pub fn read_object(path: &Path) -> StoredEntry {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no stored entry");
            return StoredEntry::Missing;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read entry");
            return StoredEntry::Corrupt;
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => StoredEntry::Object(map),
        Ok(other) => {
            warn!(path = %path.display(), kind = json_kind(&other), "entry is not an object");
            StoredEntry::Corrupt
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "entry is not valid JSON");
            StoredEntry::Corrupt
        }
    }
}

pub fn write_entry<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data)?;
    Ok(())
}

/// Interpret a field as a positive whole number.
///
/// Accepts JSON numbers and numeric strings. Fractions are truncated and a
/// truncated value of zero is rejected, as are negatives and non-numbers.
pub fn positive_u32(value: Option<&Value>) -> Option<u32> {
    whole_number(value).filter(|n| *n > 0)
}

/// Interpret a field as a non-negative whole number.
pub fn non_negative_u32(value: Option<&Value>) -> Option<u32> {
    whole_number(value)
}

fn whole_number(value: Option<&Value>) -> Option<u32> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() || n < 0.0 || n >= u32::MAX as f64 {
        return None;
    }
    Some(n.trunc() as u32)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_entry_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(read_object(&dir.path().join("nope.json")), StoredEntry::Missing);
    }

    #[test]
    fn malformed_entry_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();
        assert_eq!(read_object(&path), StoredEntry::Corrupt);

        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert_eq!(read_object(&path), StoredEntry::Corrupt);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("entry.json");
        write_entry(&path, &json!({"x": 1})).unwrap();
        match read_object(&path) {
            StoredEntry::Object(map) => assert_eq!(map.get("x"), Some(&json!(1))),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn write_fails_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let result = write_entry(&blocker.join("entry.json"), &json!({}));
        assert!(matches!(result, Err(PersistenceError::Io(_))));
    }

    #[test]
    fn number_coercion() {
        assert_eq!(positive_u32(Some(&json!(1500))), Some(1500));
        assert_eq!(positive_u32(Some(&json!("300"))), Some(300));
        assert_eq!(positive_u32(Some(&json!(90.9))), Some(90));
        assert_eq!(positive_u32(Some(&json!(0))), None);
        assert_eq!(positive_u32(Some(&json!(0.4))), None);
        assert_eq!(positive_u32(Some(&json!(-5))), None);
        assert_eq!(positive_u32(Some(&json!("abc"))), None);
        assert_eq!(positive_u32(Some(&json!(true))), None);
        assert_eq!(positive_u32(Some(&json!(null))), None);
        assert_eq!(positive_u32(None), None);

        assert_eq!(non_negative_u32(Some(&json!(0))), Some(0));
        assert_eq!(non_negative_u32(Some(&json!(-1))), None);
    }
}
