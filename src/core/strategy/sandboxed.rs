use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::install::InstalledProgram;
use crate::core::launch::LaunchDescriptor;
use crate::core::mods::{stage_sandboxed, StagingContext, StagingReport};
use crate::core::platform::Platform;
use crate::core::state::LauncherConfig;

use super::{InstallLayout, LaunchStrategy};

/// Linux: the flatpak runtime installs, updates and runs the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxedStrategy;

#[async_trait]
impl LaunchStrategy for SandboxedStrategy {
    fn platform(&self) -> Platform {
        Platform::LinuxSandboxed
    }

    fn install_layout(&self) -> Option<InstallLayout> {
        None
    }

    async fn stage_mods(&self, ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
        stage_sandboxed(ctx).await
    }

    fn launch_descriptor(
        &self,
        _installed: Option<&InstalledProgram>,
        _config: &LauncherConfig,
    ) -> LauncherResult<LaunchDescriptor> {
        Ok(LaunchDescriptor::sandboxed_runtime())
    }
}
