// Entry points the UI (or the CLI standing in for it) calls into.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::cleaner::{self, CleanTarget};
use crate::core::error::LauncherError;
use crate::core::install::InstalledProgram;
use crate::core::logs;
use crate::core::mods::{self, FlagMode, StagingReport};
use crate::core::pipeline::{self, InstallLock, LaunchReport};
use crate::core::process;
use crate::core::state::{AppState, LauncherConfig};
use crate::core::strategy::{LaunchStrategy, Strategy};

pub async fn launch(state: &Arc<Mutex<AppState>>) -> Result<LaunchReport, LauncherError> {
    let state = state.lock().await;
    pipeline::launch(&state.launch_context()).await
}

/// Studio gets its own strategy and install root, so the client's install is untouched.
pub async fn launch_studio(state: &Arc<Mutex<AppState>>) -> Result<LaunchReport, LauncherError> {
    let state = state.lock().await;
    let strategy = Strategy::studio_for_platform(state.strategy.platform())?;
    pipeline::launch(&state.studio_context(&strategy)).await
}

/// Install or update without launching.
pub async fn ensure_installed(
    state: &Arc<Mutex<AppState>>,
) -> Result<Option<InstalledProgram>, LauncherError> {
    let state = state.lock().await;
    let ctx = state.launch_context();
    let _lock = InstallLock::acquire(ctx.install_root)?;

    let result = pipeline::ensure_installed(&ctx).await;
    ctx.events.progress_close();
    result
}

/// Apply the current settings to disk without launching.
pub async fn stage_mods(state: &Arc<Mutex<AppState>>) -> Result<StagingReport, LauncherError> {
    let state = state.lock().await;
    let ctx = state.launch_context();

    match mods_for(&ctx).await {
        Ok(report) => {
            ctx.events.notify("Settings saved successfully!");
            Ok(report)
        }
        Err(e) => {
            warn!("Saving settings failed: {}", e);
            ctx.events.notify(&format!("Failed to save settings: {}", e));
            Err(e)
        }
    }
}

async fn mods_for(ctx: &pipeline::LaunchContext<'_>) -> Result<StagingReport, LauncherError> {
    ctx.strategy.stage_mods(&ctx.staging()).await
}

pub async fn run_cleaner(
    state: &Arc<Mutex<AppState>>,
    max_age_days: u32,
    targets: &[CleanTarget],
) -> Result<usize, LauncherError> {
    let state = state.lock().await;
    let dirs: Vec<_> = targets
        .iter()
        .flat_map(|target| target.dirs(&state.paths))
        .collect();

    let removed = cleaner::clean_old_files(&dirs, cleaner::days(max_age_days)).await;
    state.events.notify(&format!("Cleaned {} files.", removed));
    Ok(removed)
}

pub async fn fetch_flag_catalog(
    state: &Arc<Mutex<AppState>>,
    mode: FlagMode,
) -> Result<serde_json::Value, LauncherError> {
    let fetcher = state.lock().await.fetcher.clone();
    mods::fetch_flag_catalog(fetcher.as_ref(), mode).await
}

pub fn is_target_running() -> bool {
    process::is_target_running()
}

pub async fn current_game_name(state: &Arc<Mutex<AppState>>) -> String {
    let dirs = state.lock().await.paths.log_dirs();
    logs::current_game_name(&dirs).await
}

pub async fn get_launcher_settings(state: &Arc<Mutex<AppState>>) -> LauncherConfig {
    state.lock().await.config.clone()
}

pub async fn update_launcher_settings(
    state: &Arc<Mutex<AppState>>,
    config: LauncherConfig,
) -> Result<(), LauncherError> {
    let mut state = state.lock().await;
    state.config = config;
    state.save_settings()?;
    info!("Launcher settings saved");
    Ok(())
}
