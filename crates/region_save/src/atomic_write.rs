//! Write-rename file replacement, so a crash mid-save never truncates the
//! previous weather file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `data` to `{path}.tmp`, sync it, then rename it over `path`.
/// Missing parent directories are created.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "region_save_atomic_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_creates_file_without_leftover_tmp() {
        let dir = test_dir("creates");
        let path = dir.join("weather.bin");
        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!tmp_path_for(&path).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_overwrites_existing() {
        let dir = test_dir("overwrites");
        let path = dir.join("weather.bin");
        atomic_write(&path, b"version 1").unwrap();
        atomic_write(&path, b"version 2").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"version 2");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = test_dir("nested");
        let path = dir.join("a").join("b").join("weather.bin");
        atomic_write(&path, b"nested").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"nested");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stale_tmp_is_replaced() {
        let dir = test_dir("stale_tmp");
        let path = dir.join("weather.bin");
        fs::write(tmp_path_for(&path), b"leftover from a crash").unwrap();
        atomic_write(&path, b"fresh").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"fresh");
        assert!(!tmp_path_for(&path).exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
