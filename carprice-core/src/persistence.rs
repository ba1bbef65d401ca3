//! Shared persistence utilities: atomic file writes and "latest file" lookup.
//!
//! Every file the pipeline produces (cleaned data, artifacts, prediction
//! output) goes through [`atomic_write`], so a reader never observes a
//! half-written file.

use std::io;
use std::path::{Path, PathBuf};

/// Atomically write raw bytes to a file.
///
/// Writes to a `.tmp` sibling, syncs it, then renames over the target path.
/// Creates parent directories if they don't exist. On failure the temporary
/// file is removed and the previous target (if any) is left untouched.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = tmp_path(path);
    let result = write_and_sync(&tmp, data).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_and_sync(tmp: &Path, data: &[u8]) -> io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(tmp)?;
    file.write_all(data)?;
    file.sync_all()
}

/// The temporary sibling used while `path` is being written.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Return the lexicographically last file in `dir` with the given extension.
///
/// Returns `Ok(None)` if the directory holds no matching file.
pub fn latest_file(dir: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let mut names: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    names.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(names.pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dir").join("model.json");

        atomic_write(&path, b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.bin");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn test_atomic_write_no_tmp_leftover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.csv");

        atomic_write(&path, b"a,b\n").unwrap();

        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_tmp_path_keeps_extension() {
        let tmp = tmp_path(Path::new("models/car_price_model.json"));
        assert_eq!(tmp, PathBuf::from("models/car_price_model.json.tmp"));
    }

    #[test]
    fn test_latest_file_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        for name in ["2024-01-05.csv", "2024-03-01.csv", "2024-02-11.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let latest = latest_file(dir.path(), "csv").unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "2024-03-01.csv");
    }

    #[test]
    fn test_latest_file_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(latest_file(dir.path(), "csv").unwrap().is_none());
    }
}
