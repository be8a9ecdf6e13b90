use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstalledProgram;
use crate::core::launch::{affinity_mask, LaunchDescriptor};
use crate::core::mods::{stage_desktop, StagingContext, StagingReport};
use crate::core::platform::{BinaryKind, Platform, WINDOWS_PLAYER_EXE};
use crate::core::state::LauncherConfig;

use super::{InstallLayout, LaunchStrategy};

/// `AppSettings.xml` expected next to the client executable.
#[derive(Debug, Serialize)]
#[serde(rename = "Settings")]
struct AppSettings {
    #[serde(rename = "ContentFolder")]
    content_folder: &'static str,
    #[serde(rename = "BaseUrl")]
    base_url: &'static str,
}

pub fn app_settings_xml() -> LauncherResult<String> {
    let body = quick_xml::se::to_string(&AppSettings {
        content_folder: "content",
        base_url: "http://www.roblox.com",
    })
    .map_err(|e| LauncherError::Xml(e.to_string()))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n{}", body))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsStrategy;

#[async_trait]
impl LaunchStrategy for WindowsStrategy {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        Some(InstallLayout {
            binary_kind: BinaryKind::WindowsPlayer,
            executable: WINDOWS_PLAYER_EXE,
            archive_url_template: "https://setup.rbxcdn.com/{version}-RobloxApp.zip",
            mark_executable: false,
        })
    }

    async fn finalize_install(&self, version_dir: &Path, _executable: &Path) -> LauncherResult<()> {
        let settings_path = version_dir.join("AppSettings.xml");
        if !settings_path.exists() {
            tokio::fs::write(&settings_path, app_settings_xml()?)
                .await
                .map_err(|source| LauncherError::Io {
                    path: settings_path.clone(),
                    source,
                })?;
            debug!("Wrote {:?}", settings_path);
        }

        let client_settings = version_dir.join("ClientSettings");
        tokio::fs::create_dir_all(&client_settings)
            .await
            .map_err(|source| LauncherError::Io {
                path: client_settings,
                source,
            })
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
        stage_desktop(ctx).await
    }

    fn launch_descriptor(
        &self,
        installed: Option<&InstalledProgram>,
        config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor> {
        let installed = installed
            .ok_or_else(|| LauncherError::Other("No installed client to launch".into()))?;
        LaunchDescriptor::windows_start(
            &installed.executable,
            affinity_mask(config.cpu_core_limit),
        )
    }
}
