use std::path::Path;

use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstalledProgram;
use crate::core::launch::LaunchDescriptor;
use crate::core::mods::{stage_desktop, stage_vinegar, StagingContext, StagingReport};
use crate::core::platform::{BinaryKind, Platform, WINDOWS_STUDIO_EXE};
use crate::core::state::LauncherConfig;

use super::{InstallLayout, LaunchStrategy, WindowsStrategy};

/// Studio on Windows: its own build from the CDN, same fix-ups as the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsStudioStrategy;

#[async_trait]
impl LaunchStrategy for WindowsStudioStrategy {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn display_name(&self) -> &'static str {
        "Roblox Studio"
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        Some(InstallLayout {
            binary_kind: BinaryKind::WindowsStudio64,
            executable: WINDOWS_STUDIO_EXE,
            archive_url_template: "https://setup.rbxcdn.com/{version}-RobloxStudio.zip",
            mark_executable: false,
        })
    }

    async fn finalize_install(&self, version_dir: &Path, executable: &Path) -> LauncherResult<()> {
        WindowsStrategy.finalize_install(version_dir, executable).await
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
            .ok_or_else(|| LauncherError::Other("No installed Studio to launch".into()))?;
        LaunchDescriptor::windows_open(&installed.executable)
    }
}

/// Studio on Linux runs inside the Vinegar flatpak, which owns its install.
#[derive(Debug, Clone, Copy, Default)]
pub struct VinegarStrategy;

#[async_trait]
impl LaunchStrategy for VinegarStrategy {
    fn platform(&self) -> Platform {
        Platform::LinuxSandboxed
    }

    fn display_name(&self) -> &'static str {
        "Roblox Studio"
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        None
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
        stage_vinegar(ctx).await
    }

    fn launch_descriptor(
        &self,
        _installed: Option<&InstalledProgram>,
        _config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor> {
        Ok(LaunchDescriptor::sandboxed_studio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn studio_layout_uses_its_own_build() {
        let layout = WindowsStudioStrategy.install_layout().unwrap();
        assert_eq!(layout.binary_kind, BinaryKind::WindowsStudio64);
        assert_eq!(
            layout.archive_url("version-s1"),
            "https://setup.rbxcdn.com/version-s1-RobloxStudio.zip"
        );
        assert_eq!(
            layout.executable_path(Path::new("/v")),
            Path::new("/v").join("RobloxStudioBeta.exe")
        );
    }

    #[test]
    fn studio_ignores_the_core_limit() {
        let version_dir = PathBuf::from("C:/rblx-studio-versions/s1");
        let installed = InstalledProgram {
            version: "s1".into(),
            executable: version_dir.join(WINDOWS_STUDIO_EXE),
            version_dir,
            freshly_installed: false,
        };
        let mut config = LauncherConfig::default();
        config.cpu_core_limit = 2;

        let descriptor = WindowsStudioStrategy
            .launch_descriptor(Some(&installed), &config)
            .unwrap();

        assert!(!descriptor.args.iter().any(|a| a == "/affinity" || a == "--app"));
        assert_eq!(
            descriptor.args.last(),
            Some(&crate::core::launch::display_path(&installed.executable))
        );
    }

    #[tokio::test]
    async fn studio_install_gets_app_settings() {
        let temp = tempfile::tempdir().unwrap();
        WindowsStudioStrategy
            .finalize_install(temp.path(), &temp.path().join(WINDOWS_STUDIO_EXE))
            .await
            .unwrap();
        assert!(temp.path().join("AppSettings.xml").is_file());
    }

    #[test]
    fn vinegar_runs_the_flatpak() {
        let descriptor = VinegarStrategy
            .launch_descriptor(None, &LauncherConfig::default())
            .unwrap();
        assert_eq!(descriptor.args, vec!["run", "org.vinegarhq.Vinegar"]);
        assert!(VinegarStrategy.install_layout().is_none());
    }
}
