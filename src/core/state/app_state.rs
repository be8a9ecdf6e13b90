use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::downloader::{Downloader, Fetcher};
use crate::core::error::LauncherResult;
use crate::core::events::{EventSink, TracingEvents};
use crate::core::launch::{Spawner, SystemSpawner};
use crate::core::mods::{BundledAssets, FsBackend, StagingBackend};
use crate::core::paths::RuntimePaths;
use crate::core::pipeline::LaunchContext;
use crate::core::platform::Platform;
use crate::core::process;
use crate::core::strategy::{LaunchStrategy, Strategy};

use super::settings::LauncherConfig;

/// Long-lived collaborators for one process.
pub struct AppState {
    pub paths: RuntimePaths,
    pub config: LauncherConfig,
    pub strategy: Strategy,
    pub fetcher: Arc<dyn Fetcher>,
    pub backend: Arc<dyn StagingBackend>,
    pub spawner: Arc<dyn Spawner>,
    pub events: Arc<dyn EventSink>,
    pub assets: BundledAssets,
    sober_config_path: Option<PathBuf>,
    vinegar_config_path: Option<PathBuf>,
    install_root: PathBuf,
    studio_install_root: PathBuf,
    custom_skybox_dir: PathBuf,
}

impl AppState {
    /// Host defaults: reqwest downloads, on-disk staging, real processes.
    pub fn new(paths: RuntimePaths, config: LauncherConfig, platform: Platform) -> LauncherResult<Self> {
        let backend = FsBackend::new(platform, paths.flag_search_roots(platform));
        Ok(Self::with_collaborators(
            paths,
            config,
            platform,
            Arc::new(Downloader::new()?),
            Arc::new(backend),
            Arc::new(SystemSpawner),
            Arc::new(TracingEvents),
        ))
    }

    pub fn with_collaborators(
        paths: RuntimePaths,
        config: LauncherConfig,
        platform: Platform,
        fetcher: Arc<dyn Fetcher>,
        backend: Arc<dyn StagingBackend>,
        spawner: Arc<dyn Spawner>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let assets = BundledAssets::scan(paths.assets_dir());
        Self {
            sober_config_path: paths.sober_config_path(),
            vinegar_config_path: paths.vinegar_config_path(),
            install_root: paths.install_root(),
            studio_install_root: paths.studio_install_root(),
            custom_skybox_dir: paths.custom_skybox_dir(),
            strategy: Strategy::for_platform(platform),
            paths,
            config,
            fetcher,
            backend,
            spawner,
            events,
            assets,
        }
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        self.config.save(&self.paths.settings_file())
    }

    pub fn launch_context(&self) -> LaunchContext<'_> {
        self.context_for(&self.strategy, &self.install_root)
    }

    /// Same collaborators, pointed at Studio's strategy and install root.
    pub fn studio_context<'a>(&'a self, strategy: &'a Strategy) -> LaunchContext<'a> {
        self.context_for(strategy, &self.studio_install_root)
    }

    fn context_for<'a>(
        &'a self,
        strategy: &'a dyn LaunchStrategy,
        install_root: &'a Path,
    ) -> LaunchContext<'a> {
        LaunchContext {
            strategy,
            config: &self.config,
            install_root,
            fetcher: self.fetcher.as_ref(),
            backend: self.backend.as_ref(),
            spawner: self.spawner.as_ref(),
            events: self.events.as_ref(),
            assets: &self.assets,
            custom_skybox_dir: &self.custom_skybox_dir,
            sober_config_path: self.sober_config_path.as_deref(),
            vinegar_config_path: self.vinegar_config_path.as_deref(),
            running_check: process::is_target_running,
        }
    }
}
