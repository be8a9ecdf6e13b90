// ─── Mod Staging ───
// Writes flag overrides and skybox textures before every launch so that
// settings changed since the last run take effect.

pub mod backend;
pub mod flags;
pub mod skybox;
pub mod sober;
pub mod vinegar;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::LauncherConfig;

pub use backend::{FsBackend, StagingBackend};
pub use flags::{coerce_flags, fetch_flag_catalog, FlagMode};
pub use skybox::{BundledAssets, SkyboxSelection, SKYBOX_FACES};
pub use sober::merge_sober_config;
pub use vinegar::merge_vinegar_config;

/// Everything a staging pass reads.
pub struct StagingContext<'a> {
    pub config: &'a LauncherConfig,
    pub backend: &'a dyn StagingBackend,
    pub assets: &'a BundledAssets,
    pub custom_skybox_dir: &'a Path,
    pub sober_config_path: Option<&'a Path>,
    pub vinegar_config_path: Option<&'a Path>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    pub player_flag_targets: usize,
    pub studio_flag_targets: usize,
    pub faces_staged: usize,
    pub faces_skipped: usize,
    pub runtime_config_written: bool,
}

/// Flags for both groups, then the skybox, through the backend.
///
/// The two artifacts are staged independently: a failure in one does not
/// stop the other, and the first failure is returned once both have run.
/// Studio flags are allowed to fail outright since Studio may simply not
/// be installed.
pub async fn stage_desktop(ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
    let mut report = StagingReport::default();
    let mut first_error: Option<LauncherError> = None;

    let player = coerce_flags(&ctx.config.fast_flags);
    match ctx.backend.write_flags(FlagMode::Player, &player).await {
        Ok(count) => report.player_flag_targets = count,
        Err(e) => {
            warn!("Failed to save player flags: {}", e);
            first_error.get_or_insert(e);
        }
    }

    let studio = coerce_flags(&ctx.config.fast_flags_studio);
    match ctx.backend.write_flags(FlagMode::Studio, &studio).await {
        Ok(count) => report.studio_flag_targets = count,
        Err(e) => info!("Studio flags not applied: {}", e),
    }

    if let Err(e) = stage_skybox(ctx, &mut report).await {
        warn!("Failed to apply skybox: {}", e);
        first_error.get_or_insert(e);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

async fn stage_skybox(ctx: &StagingContext<'_>, report: &mut StagingReport) -> LauncherResult<()> {
    let selection = SkyboxSelection::parse(&ctx.config.current_skybox, ctx.custom_skybox_dir);
    if selection == SkyboxSelection::None {
        debug!("No skybox selected");
        return Ok(());
    }

    info!("Applying skybox {:?}", selection);
    for face in SKYBOX_FACES {
        match selection.read_face(face, ctx.assets).await? {
            Some(bytes) => {
                ctx.backend.write_texture(face, &bytes).await?;
                report.faces_staged += 1;
            }
            None => report.faces_skipped += 1,
        }
    }
    Ok(())
}

/// Player flags and runtime settings merged into the sandboxed runtime's
/// config document. Textures are not supported there.
pub async fn stage_sandboxed(ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
    let path = ctx.sober_config_path.ok_or_else(|| {
        LauncherError::Other("No home directory for the sandboxed runtime config".into())
    })?;

    let player = coerce_flags(&ctx.config.fast_flags);
    merge_sober_config(path, &ctx.config.sober, &player).await?;

    Ok(StagingReport {
        runtime_config_written: true,
        ..StagingReport::default()
    })
}

/// Studio flags merged into Vinegar's config, for Studio on Linux.
pub async fn stage_vinegar(ctx: &StagingContext<'_>) -> LauncherResult<StagingReport> {
    let path = ctx.vinegar_config_path.ok_or_else(|| {
        LauncherError::Other("No home directory for the Studio runtime config".into())
    })?;

    merge_vinegar_config(path, &ctx.config.fast_flags_studio).await?;

    Ok(StagingReport {
        studio_flag_targets: 1,
        runtime_config_written: true,
        ..StagingReport::default()
    })
}
