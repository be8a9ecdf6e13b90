// ─── Archive Installer ───
// Downloads the client archive for one version and unpacks it into that
// version's directory. The executable only ever appears at its final path
// once the whole installation is in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::downloader::{DownloadProgress, Fetcher};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSink, ProgressUpdate};
use crate::core::process;
use crate::core::strategy::{InstallLayout, LaunchStrategy};

use super::archive::extract_archive;

/// A version that is ready to launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledProgram {
    pub version: String,
    pub version_dir: PathBuf,
    pub executable: PathBuf,
    /// `false` when the executable was already present.
    pub freshly_installed: bool,
}

pub struct ArchiveInstaller<'a> {
    fetcher: &'a dyn Fetcher,
    events: &'a dyn EventSink,
    is_running: fn() -> bool,
}

impl<'a> ArchiveInstaller<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, events: &'a dyn EventSink) -> Self {
        Self {
            fetcher,
            events,
            is_running: process::is_target_running,
        }
    }

    /// Replace the process-table check, mostly for tests.
    pub fn with_running_check(mut self, is_running: fn() -> bool) -> Self {
        self.is_running = is_running;
        self
    }

    /// Make sure `version` is installed under `install_root`.
    pub async fn ensure_installed(
        &self,
        strategy: &dyn LaunchStrategy,
        install_root: &Path,
        version: &str,
        auto_update: bool,
    ) -> LauncherResult<InstalledProgram> {
        let layout = strategy.install_layout().ok_or_else(|| {
            LauncherError::Unsupported(format!("Installing on {}", strategy.platform()))
        })?;

        let version_dir = install_root.join(version);
        let executable = layout.executable_path(&version_dir);

        if executable.exists() {
            info!("Version {} already installed", version);
            return Ok(InstalledProgram {
                version: version.to_string(),
                version_dir,
                executable,
                freshly_installed: false,
            });
        }

        if !auto_update {
            return Err(LauncherError::UpdateDisabled {
                version: version.to_string(),
            });
        }

        if (self.is_running)() {
            return Err(LauncherError::ProgramRunning);
        }

        let staging_dir = install_root.join(format!(".{}.partial", version));
        remove_dir_if_present(&staging_dir).await?;

        let populated = self
            .populate(strategy, &layout, version, &staging_dir)
            .await;
        if let Err(e) = populated {
            if let Err(cleanup) = remove_dir_if_present(&staging_dir).await {
                warn!("Could not remove partial install: {}", cleanup);
            }
            return Err(e);
        }

        remove_dir_if_present(&version_dir).await?;
        tokio::fs::rename(&staging_dir, &version_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: version_dir.clone(),
                source,
            })?;

        info!("Installed version {} into {:?}", version, version_dir);
        Ok(InstalledProgram {
            version: version.to_string(),
            version_dir,
            executable,
            freshly_installed: true,
        })
    }

    async fn populate(
        &self,
        strategy: &dyn LaunchStrategy,
        layout: &InstallLayout,
        version: &str,
        staging_dir: &Path,
    ) -> LauncherResult<()> {
        let url = layout.archive_url(version);
        info!("Downloading {}", url);
        self.events.progress(ProgressUpdate::new("Downloading...", 20));

        let last_percent = AtomicU8::new(0);
        let events = self.events;
        let on_progress = move |progress: DownloadProgress| {
            if let Some(percent) = progress.percent() {
                if last_percent.swap(percent, Ordering::Relaxed) != percent {
                    let overall = 20 + (u16::from(percent) * 40 / 100) as u8;
                    events.progress(ProgressUpdate::new("Downloading...", overall));
                }
            }
        };

        let payload = self.fetcher.get_with_progress(&url, &on_progress).await?;
        if !payload.is_success() {
            return Err(LauncherError::DownloadFailed {
                url,
                status: payload.status,
            });
        }

        self.events.progress(ProgressUpdate::new("Extracting...", 60));
        extract_archive(payload.body, staging_dir).await?;

        let executable = layout.executable_path(staging_dir);
        if !executable.is_file() {
            return Err(LauncherError::Extraction {
                entry: layout.executable.to_string(),
                reason: "archive does not contain the executable".into(),
            });
        }

        if layout.mark_executable {
            mark_executable(&executable)?;
        }

        strategy.finalize_install(staging_dir, &executable).await?;
        self.events.progress(ProgressUpdate::new("Extracting...", 80));
        Ok(())
    }
}

/// `chmod +x` on the given file.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let permission_error = |e: std::io::Error| LauncherError::Permission {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut perms = std::fs::metadata(path)
        .map_err(permission_error)?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms).map_err(permission_error)
}

#[cfg(not(unix))]
pub fn mark_executable(_path: &Path) -> LauncherResult<()> {
    Ok(())
}

async fn remove_dir_if_present(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LauncherError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
