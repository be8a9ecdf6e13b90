// ─── Archive Extraction ───
// Unpacks a downloaded ZIP into a directory, one entry at a time.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Counts of what an extraction wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
}

/// Extract `bytes` (a ZIP archive) into `dest`.
///
/// Runs on a blocking worker; entries are written strictly in archive
/// order. Any entry that would land outside `dest` aborts the extraction.
pub async fn extract_archive(bytes: Vec<u8>, dest: &Path) -> LauncherResult<ExtractSummary> {
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_into(Cursor::new(bytes), &dest))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

fn malformed(entry: impl Into<String>, err: impl std::fmt::Display) -> LauncherError {
    LauncherError::Extraction {
        entry: entry.into(),
        reason: err.to_string(),
    }
}

fn io_at(path: &Path, source: std::io::Error) -> LauncherError {
    LauncherError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn extract_into<R: Read + std::io::Seek>(
    reader: R,
    dest: &Path,
) -> LauncherResult<ExtractSummary> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| malformed("<archive>", e))?;
    let mut summary = ExtractSummary::default();

    std::fs::create_dir_all(dest).map_err(|e| io_at(dest, e))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| malformed(format!("#{}", index), e))?;
        let name = entry.name().to_string();

        let rel_path = sanitize_entry_path(&name)
            .filter(|_| entry.enclosed_name().is_some())
            .ok_or_else(|| malformed(&name, "path escapes the target directory"))?;

        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(&rel_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| io_at(&out_path, e))?;
            summary.directories += 1;
            continue;
        }

        // Archives are not required to list parent directories first.
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_at(parent, e))?;
        }

        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            entry
                .read_to_string(&mut target)
                .map_err(|e| malformed(&name, e))?;
            let target = target.trim().to_string();
            if !is_contained_link_target(&target) {
                return Err(malformed(
                    &name,
                    format!("symlink target {:?} leaves the target directory", target),
                ));
            }
            write_symlink(&target, &out_path)?;
            summary.symlinks += 1;
            continue;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|e| io_at(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| malformed(&name, e))?;
        drop(out);

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode((mode & 0o777) | 0o600);
            std::fs::set_permissions(&out_path, perms).map_err(|e| io_at(&out_path, e))?;
        }

        summary.files += 1;
    }

    debug!(
        "Extracted {} files, {} directories, {} symlinks into {:?}",
        summary.files, summary.directories, summary.symlinks, dest
    );
    Ok(summary)
}

/// Turn an archive entry name into a relative path made only of normal
/// components. `None` for absolute paths, drive prefixes and any `..`.
pub fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') || normalized.contains('\0') {
        return None;
    }

    let mut rel = PathBuf::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ if part.contains(':') => return None,
            _ => rel.push(part),
        }
    }

    if rel
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        Some(rel)
    } else {
        None
    }
}

/// Symlinks may only point downwards, relative to their own directory.
fn is_contained_link_target(target: &str) -> bool {
    !target.is_empty() && sanitize_entry_path(target).is_some_and(|p| !p.as_os_str().is_empty())
}

#[cfg(unix)]
fn write_symlink(target: &str, link: &Path) -> LauncherResult<()> {
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(link).map_err(|e| io_at(link, e))?;
    }
    std::os::unix::fs::symlink(target, link).map_err(|e| io_at(link, e))
}

#[cfg(not(unix))]
fn write_symlink(target: &str, link: &Path) -> LauncherResult<()> {
    tracing::warn!("Skipping symlink {:?} -> {} on this platform", link, target);
    Ok(())
}
