use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CompileError;

/// Suffix of log archives CloudTrail delivers before decompression
const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix `sed -i.bak` leaves behind when stripping line endings in place
const BACKUP_SUFFIX: &str = ".bak";

/// Expand a leading `~` to the current user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Whether the file name marks a still-compressed archive
pub fn is_compressed(path: &Path) -> bool {
    file_name_ends_with(path, COMPRESSED_SUFFIX)
}

/// Whether the file name marks a backup left by an in-place edit
pub fn is_backup(path: &Path) -> bool {
    file_name_ends_with(path, BACKUP_SUFFIX)
}

fn file_name_ends_with(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(suffix))
}

/// Recursively list every regular file under `root`.
///
/// Entries are visited in file-name order at each level so that compiled
/// output is reproducible across runs and platforms. Symlinks to files are
/// listed; symlinks to directories are not descended.
pub fn enumerate_files(root: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let metadata = fs::metadata(root).map_err(|e| CompileError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(CompileError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CompileError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| CompileError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CompileError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CompileError::io(&path, e))?;
        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() {
            files.push(path);
        } else if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) if target.is_file() => files.push(path),
                _ => debug!(path = %path.display(), "not following symlink"),
            }
        }
    }

    Ok(())
}
