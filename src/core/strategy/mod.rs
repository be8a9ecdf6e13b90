// ─── Platform Strategies ───
// Everything that differs between Windows, macOS and the sandboxed Linux
// runtime, selected once per run. Studio has its own pair of strategies.

pub mod macos;
pub mod sandboxed;
pub mod studio;
pub mod windows;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstalledProgram;
use crate::core::launch::LaunchDescriptor;
use crate::core::mods::{StagingContext, StagingReport};
use crate::core::platform::{BinaryKind, Platform};
use crate::core::state::LauncherConfig;

pub use macos::MacOsStrategy;
pub use sandboxed::SandboxedStrategy;
pub use studio::{VinegarStrategy, WindowsStudioStrategy};
pub use windows::WindowsStrategy;

/// Where a platform's client lives inside a version directory and where its
/// archive comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallLayout {
    pub binary_kind: BinaryKind,
    /// Relative to the version directory, `/`-separated.
    pub executable: &'static str,
    /// Contains a `{version}` placeholder.
    pub archive_url_template: &'static str,
    pub mark_executable: bool,
}

impl InstallLayout {
    pub fn executable_path(&self, version_dir: &Path) -> PathBuf {
        self.executable
            .split('/')
            .fold(version_dir.to_path_buf(), |path, part| path.join(part))
    }

    pub fn archive_url(&self, version: &str) -> String {
        self.archive_url_template.replace("{version}", version)
    }
}

#[async_trait]
pub trait LaunchStrategy: Send + Sync {
    fn platform(&self) -> Platform;

    /// Name used in notifications and presence.
    fn display_name(&self) -> &'static str {
        "Roblox"
    }

    /// `None` when an external runtime owns installation and updates.
    fn install_layout(&self) -> Option<InstallLayout>;

    /// Platform fix-ups on a freshly extracted version directory.
    async fn finalize_install(&self, _version_dir: &Path, _executable: &Path) -> LauncherResult<()> {
        Ok(())
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport>;

    fn launch_descriptor(
        &self,
        installed: Option<&InstalledProgram>,
        config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor>;
}

/// Static dispatch over the supported platforms.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    Windows(WindowsStrategy),
    MacOs(MacOsStrategy),
    Sandboxed(SandboxedStrategy),
    WindowsStudio(WindowsStudioStrategy),
    Vinegar(VinegarStrategy),
}

impl Strategy {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Strategy::Windows(WindowsStrategy),
            Platform::MacOs => Strategy::MacOs(MacOsStrategy),
            Platform::LinuxSandboxed => Strategy::Sandboxed(SandboxedStrategy),
        }
    }

    /// Studio counterpart of [`Strategy::for_platform`].
    pub fn studio_for_platform(platform: Platform) -> LauncherResult<Self> {
        match platform {
            Platform::Windows => Ok(Strategy::WindowsStudio(WindowsStudioStrategy)),
            Platform::LinuxSandboxed => Ok(Strategy::Vinegar(VinegarStrategy)),
            Platform::MacOs => Err(LauncherError::Unsupported("Roblox Studio".into())),
        }
    }

    fn inner(&self) -> &dyn LaunchStrategy {
        match self {
            Strategy::Windows(s) => s,
            Strategy::MacOs(s) => s,
            Strategy::Sandboxed(s) => s,
            Strategy::WindowsStudio(s) => s,
            Strategy::Vinegar(s) => s,
        }
    }
}

#[async_trait]
impl LaunchStrategy for Strategy {
    fn platform(&self) -> Platform {
        self.inner().platform()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        self.inner().install_layout()
    }

    async fn finalize_install(&self, version_dir: &Path, executable: &Path) -> LauncherResult<()> {
        self.inner().finalize_install(version_dir, executable).await
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
        self.inner().stage_mods(ctx).await
    }

    fn launch_descriptor(
        &self,
        installed: Option<&InstalledProgram>,
        config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor> {
        self.inner().launch_descriptor(installed, config)
    }
}
