//! JSON document storage: whole-file reads and atomic rewrites.
//!
//! Environment exports and validation reports are single pretty-printed JSON
//! documents. Writes go through a temp file in the same directory followed by
//! a rename, so readers never observe a half-written document.

use crate::error::CatalogError;
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Read and parse one JSON document.
pub fn read_json(path: impl AsRef<Path>) -> Result<Value, CatalogError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| CatalogError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CatalogError::ParseJson {
        path: path.display().to_string(),
        source,
    })
}

/// Pretty-print `payload` to `path`, replacing any previous file atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    payload: &T,
) -> Result<(), CatalogError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", parent.display())))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), CatalogError> {
        let file = File::create(&tmp_path)
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, payload)
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", tmp_path.display())))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", tmp_path.display())))?;
        let file = writer
            .into_inner()
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CatalogError::Storage(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "catdiff-kernel-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        path
    }

    #[test]
    fn write_then_read_preserves_document() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("nested").join("Pages.json");
        let payload = json!([{"identifier": "home", "widgets": []}]);

        write_json_atomic(&path, &payload).expect("write should succeed");
        let loaded = read_json(&path).expect("read should succeed");
        assert_eq!(loaded, payload);

        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_reports_missing_and_malformed_files() {
        let dir = temp_dir("errors");
        let missing = read_json(dir.join("absent.json")).expect_err("missing file");
        assert!(matches!(missing, CatalogError::ReadFile { .. }));

        let bad = dir.join("bad.json");
        fs::write(&bad, "{ not json").expect("write fixture");
        let malformed = read_json(&bad).expect_err("malformed file");
        assert!(matches!(malformed, CatalogError::ParseJson { .. }));
        let _ = fs::remove_dir_all(&dir);
    }
}
