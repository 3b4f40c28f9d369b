use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn utc_rfc3339_string(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Reads a UTF-8 text file and trims surrounding whitespace.
pub fn read_trimmed(path: &Path) -> io::Result<String> {
    fs::read_to_string(path).map(|text| text.trim().to_string())
}

/// Serializes `value` into a file that must not exist yet.
///
/// Returns an `AlreadyExists` I/O error instead of truncating a prior file.
pub fn write_json_new<T: Serialize>(path: &Path, value: &T) -> Result<(), io::Error> {
    let data = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;

    write_new_with(path, |file| {
        file.write_all(&data)?;
        file.write_all(b"\n")?;
        file.sync_all()
    })
}

/// Creates `path` exclusively and fills it; a file that fails mid-write is
/// removed so its name stays free.
fn write_new_with(
    path: &Path,
    write: impl FnOnce(&mut File) -> Result<(), io::Error>,
) -> Result<(), io::Error> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(err) = write(&mut file) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(err);
    }
    Ok(())
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_timestamp_has_no_separators() {
        let ts = DateTime::parse_from_rfc3339("2026-03-04T05:06:07Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        assert_eq!(utc_compact_string(ts), "20260304T050607Z");
    }

    #[test]
    fn write_json_new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        write_json_new(&path, &serde_json::json!({"first": true})).expect("first write");
        let error = write_json_new(&path, &serde_json::json!({"second": true}))
            .expect_err("second write should fail");
        assert_eq!(error.kind(), io::ErrorKind::AlreadyExists);

        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("first"));
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        let error = write_new_with(&path, |file| {
            file.write_all(b"{\"partial\"")?;
            Err(io::Error::other("disk full"))
        })
        .expect_err("write should fail");
        assert_eq!(error.to_string(), "disk full");
        assert!(!path.exists());

        write_json_new(&path, &serde_json::json!({"retry": true})).expect("name is free again");
        assert!(fs::read_to_string(&path).expect("read back").contains("retry"));
    }

    #[test]
    fn round4_keeps_exact_one() {
        assert_eq!(round4(1.0), 1.0);
        assert_eq!(round4(0.123456), 0.1235);
    }
}
