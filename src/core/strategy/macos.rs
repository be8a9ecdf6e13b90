use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::{mark_executable, InstalledProgram};
use crate::core::launch::LaunchDescriptor;
use crate::core::mods::{stage_desktop, StagingContext, StagingReport};
use crate::core::platform::{BinaryKind, Platform, MAC_PLAYER_BINARY, MAC_PLAYER_BUNDLE};
use crate::core::state::LauncherConfig;

use super::{InstallLayout, LaunchStrategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct MacOsStrategy;

#[async_trait]
impl LaunchStrategy for MacOsStrategy {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        Some(InstallLayout {
            binary_kind: BinaryKind::MacPlayer,
            executable: MAC_PLAYER_BINARY,
            archive_url_template: "https://setup.rbxcdn.com/mac/{version}-RobloxPlayer.zip",
            mark_executable: true,
        })
    }

    /// Clears the quarantine attribute so Gatekeeper does not block the
    /// first launch, then marks every binary in `Contents/MacOS` executable
    /// since archives do not reliably carry the mode.
    async fn finalize_install(&self, version_dir: &Path, _executable: &Path) -> LauncherResult<()> {
        let bundle = version_dir.join(MAC_PLAYER_BUNDLE);
        match tokio::process::Command::new("xattr")
            .arg("-cr")
            .arg(&bundle)
            .output()
            .await
        {
            Ok(output) if output.status.success() => debug!("Cleared attributes on {:?}", bundle),
            Ok(output) => warn!("xattr exited with {} on {:?}", output.status, bundle),
            Err(e) => warn!("Could not run xattr: {}", e),
        }

        mark_bundle_binaries(&bundle.join("Contents").join("MacOS")).await
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
        stage_desktop(ctx).await
    }

    fn launch_descriptor(
        &self,
        installed: Option<&InstalledProgram>,
        _config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor> {
        let installed = installed
            .ok_or_else(|| LauncherError::Other("No installed client to launch".into()))?;
        Ok(LaunchDescriptor::macos_open(
            &installed.version_dir.join(MAC_PLAYER_BUNDLE),
        ))
    }
}

/// `chmod +x` on every regular file directly inside `dir`.
async fn mark_bundle_binaries(dir: &Path) -> LauncherResult<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(LauncherError::Permission {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::Permission {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?
    {
        let path = entry.path();
        if path.is_file() {
            mark_executable(&path)?;
            debug!("Marked {:?} executable", path);
        }
    }
    Ok(())
}
