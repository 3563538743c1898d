//! Directory intake: find pending input files and archive processed ones.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("no .{extension} files found in {}", dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },

    #[error("failed to read directory {}: {source}", dir.display())]
    ReadDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to archive {}: {source}", file.display())]
    Archive {
        file: PathBuf,
        source: std::io::Error,
    },
}

/// All files in `dir` with the given extension (case-insensitive), sorted by
/// name for a deterministic processing order. An empty or missing directory
/// is a `NoInputFiles` error — the caller decides whether that aborts the
/// stage or is simply a quiet run.
pub fn pending_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, IntakeError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(IntakeError::NoInputFiles {
                dir: dir.to_path_buf(),
                extension: extension.to_string(),
            });
        }
        Err(source) => {
            return Err(IntakeError::ReadDir {
                dir: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(IntakeError::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }
    Ok(files)
}

/// Move a processed file into the archive directory, creating it on demand.
/// Falls back to copy-and-remove when a plain rename crosses filesystems.
pub fn archive_file(file: &Path, archive_dir: &Path) -> Result<PathBuf, IntakeError> {
    let wrap = |source| IntakeError::Archive {
        file: file.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(archive_dir).map_err(wrap)?;
    let name = file.file_name().ok_or_else(|| {
        wrap(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no file name",
        ))
    })?;
    let dest = archive_dir.join(name);

    if std::fs::rename(file, &dest).is_err() {
        std::fs::copy(file, &dest).map_err(wrap)?;
        std::fs::remove_file(file).map_err(wrap)?;
    }
    info!("archived {} -> {}", file.display(), dest.display());
    Ok(dest)
}
