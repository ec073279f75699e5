use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{RegistryError, RegistryResult};

/// Serialize a run artifact as pretty JSON and publish it atomically.
pub fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_artifact(path, &data)
}

/// Publish a run artifact through a sibling staging file, so `result.json`
/// and `report.md` are either absent or complete.
pub fn write_artifact(path: &Path, data: &[u8]) -> RegistryResult<()> {
    let run_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    create_dir_all(run_dir)?;

    let staging = staging_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&staging)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    sync_dir(run_dir)?;
    std::fs::rename(&staging, path)?;
    sync_dir(run_dir)?;
    Ok(())
}

fn staging_path(path: &Path) -> RegistryResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RegistryError::InvalidPath(path.display().to_string()))?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directories cannot be opened for syncing on Windows.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
