// ─── Launch Pipeline ───
// resolve -> reconcile -> install -> stage mods -> spawn
//
// One run per install root at a time; a second request while one is in
// flight is refused rather than queued.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSink, ProgressUpdate};
use crate::core::install::{ArchiveInstaller, InstallDirManager, InstalledProgram};
use crate::core::launch::{LaunchDescriptor, LaunchedProcess, Spawner};
use crate::core::mods::{BundledAssets, StagingBackend, StagingContext, StagingReport};
use crate::core::state::LauncherConfig;
use crate::core::strategy::LaunchStrategy;
use crate::core::version::VersionResolver;

/// Borrowed collaborators for one pipeline run.
pub struct LaunchContext<'a> {
    pub strategy: &'a dyn LaunchStrategy,
    pub config: &'a LauncherConfig,
    pub install_root: &'a Path,
    pub fetcher: &'a dyn Fetcher,
    pub backend: &'a dyn StagingBackend,
    pub spawner: &'a dyn Spawner,
    pub events: &'a dyn EventSink,
    pub assets: &'a BundledAssets,
    pub custom_skybox_dir: &'a Path,
    pub sober_config_path: Option<&'a Path>,
    pub vinegar_config_path: Option<&'a Path>,
    pub running_check: fn() -> bool,
}

impl LaunchContext<'_> {
    pub fn staging(&self) -> StagingContext<'_> {
        StagingContext {
            config: self.config,
            backend: self.backend,
            assets: self.assets,
            custom_skybox_dir: self.custom_skybox_dir,
            sober_config_path: self.sober_config_path,
            vinegar_config_path: self.vinegar_config_path,
        }
    }

    fn notify(&self, message: &str) {
        if self.config.show_notifications {
            self.events.notify(message);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub installed: Option<InstalledProgram>,
    pub staging: Option<StagingReport>,
    pub descriptor: LaunchDescriptor,
    pub process: LaunchedProcess,
}

static ACTIVE_ROOTS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();

/// Held for the duration of a pipeline run on one install root.
#[derive(Debug)]
pub struct InstallLock {
    root: PathBuf,
}

impl InstallLock {
    pub fn acquire(root: &Path) -> LauncherResult<Self> {
        let mut active = ACTIVE_ROOTS
            .get_or_init(|| Mutex::new(HashSet::new()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !active.insert(root.to_path_buf()) {
            return Err(LauncherError::LaunchInProgress(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Some(active) = ACTIVE_ROOTS.get() {
            active
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&self.root);
        }
    }
}

/// Resolve, reconcile and install. `None` on platforms whose runtime owns
/// installation.
pub async fn ensure_installed(ctx: &LaunchContext<'_>) -> LauncherResult<Option<InstalledProgram>> {
    let Some(layout) = ctx.strategy.install_layout() else {
        info!("{} runtime manages its own installation", ctx.strategy.platform());
        return Ok(None);
    };

    ctx.events
        .progress(ProgressUpdate::new("Checking for updates...", 0));
    let version = VersionResolver::new(ctx.fetcher)
        .resolve(layout.binary_kind)
        .await?;

    ctx.events
        .progress(ProgressUpdate::new("Verifying installation...", 10));
    let reconciled = InstallDirManager::new(ctx.install_root.to_path_buf())
        .reconcile(&version)
        .await?;
    if !reconciled.removed.is_empty() {
        info!("Removed {} stale version(s)", reconciled.removed.len());
    }

    let installed = ArchiveInstaller::new(ctx.fetcher, ctx.events)
        .with_running_check(ctx.running_check)
        .ensure_installed(ctx.strategy, ctx.install_root, &version, ctx.config.auto_update)
        .await?;
    Ok(Some(installed))
}

/// Stage flags and textures. Failures are reported and swallowed.
pub async fn stage_mods(ctx: &LaunchContext<'_>) -> Option<StagingReport> {
    ctx.events.progress(ProgressUpdate::new("Applying mods...", 85));
    match ctx.strategy.stage_mods(&ctx.staging()).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Mod staging failed: {}", e);
            ctx.events.notify(&format!("Failed to apply mods: {}", e));
            None
        }
    }
}

/// The whole launch flow.
pub async fn launch(ctx: &LaunchContext<'_>) -> LauncherResult<LaunchReport> {
    let _lock = InstallLock::acquire(ctx.install_root)?;

    let result = run_launch(ctx).await;
    ctx.events.progress_close();

    match result {
        Ok(report) => {
            ctx.notify(&format!("Launching {}...", ctx.strategy.display_name()));
            Ok(report)
        }
        Err(e) => {
            error!("Launch failed: {}", e);
            ctx.notify(&e.to_string());
            Err(e)
        }
    }
}

async fn run_launch(ctx: &LaunchContext<'_>) -> LauncherResult<LaunchReport> {
    let installed = ensure_installed(ctx).await?;
    let staging = stage_mods(ctx).await;

    ctx.events.progress(ProgressUpdate::new("Launching...", 100));
    if ctx.config.discord_rpc_enabled {
        ctx.events.presence(
            &format!("Launching {}", ctx.strategy.display_name()),
            "Preparing to play",
        );
    }

    let descriptor = ctx
        .strategy
        .launch_descriptor(installed.as_ref(), ctx.config)?;
    let process = ctx.spawner.spawn(&descriptor)?;
    info!("Started {} (pid {})", descriptor.program, process.pid);

    Ok(LaunchReport {
        installed,
        staging,
        descriptor,
        process,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::HttpPayload;
    use crate::core::mods::{FsBackend, SKYBOX_FACES};
    use crate::core::platform::{
        BinaryKind, Platform, MAC_PLAYER_BINARY, MAC_PLAYER_BUNDLE, WINDOWS_STUDIO_EXE,
    };
    use crate::core::strategy::{MacOsStrategy, SandboxedStrategy, WindowsStudioStrategy};
    use crate::core::version::version_url;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};

    struct FakeCdn {
        routes: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeCdn {
        fn serving(version: &str) -> Self {
            let mut routes = HashMap::new();
            routes.insert(
                version_url(BinaryKind::MacPlayer),
                format!(r#"{{"version":"0.1","clientVersionUpload":"{}"}}"#, version).into_bytes(),
            );
            routes.insert(
                format!("https://setup.rbxcdn.com/mac/{}-RobloxPlayer.zip", version),
                player_archive(),
            );
            Self {
                routes,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn serving_studio(version: &str) -> Self {
            let mut routes = HashMap::new();
            routes.insert(
                version_url(BinaryKind::WindowsStudio64),
                format!(r#"{{"clientVersionUpload":"{}"}}"#, version).into_bytes(),
            );
            routes.insert(
                format!("https://setup.rbxcdn.com/{}-RobloxStudio.zip", version),
                archive_with(&[WINDOWS_STUDIO_EXE, "content/fonts/a.ttf"]),
            );
            Self {
                routes,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn archive_requests(&self) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.ends_with(".zip"))
                .count()
        }
    }

    #[async_trait]
    impl Fetcher for FakeCdn {
        async fn get(&self, url: &str) -> LauncherResult<HttpPayload> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(match self.routes.get(url) {
                Some(body) => HttpPayload {
                    status: 200,
                    body: body.clone(),
                },
                None => HttpPayload {
                    status: 404,
                    body: Vec::new(),
                },
            })
        }
    }

    fn player_archive() -> Vec<u8> {
        archive_with(&[
            MAC_PLAYER_BINARY,
            "RobloxPlayer.app/Contents/Resources/content/fonts/a.ttf",
        ])
    }

    fn archive_with(names: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"data").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[derive(Default)]
    struct RecordingSpawner {
        spawned: Mutex<Vec<LaunchDescriptor>>,
    }

    impl Spawner for RecordingSpawner {
        fn spawn(&self, descriptor: &LaunchDescriptor) -> LauncherResult<LaunchedProcess> {
            self.spawned.lock().unwrap().push(descriptor.clone());
            Ok(LaunchedProcess { pid: 4242 })
        }
    }

    #[derive(Default)]
    struct RecordingEvents {
        statuses: Mutex<Vec<String>>,
        notifications: Mutex<Vec<String>>,
        presence: Mutex<Vec<String>>,
    }

    impl EventSink for RecordingEvents {
        fn progress(&self, update: ProgressUpdate) {
            self.statuses.lock().unwrap().push(update.status);
        }

        fn notify(&self, message: &str) {
            self.notifications.lock().unwrap().push(message.to_string());
        }

        fn presence(&self, details: &str, _state: &str) {
            self.presence.lock().unwrap().push(details.to_string());
        }
    }

    fn not_running() -> bool {
        false
    }

    struct Fixture {
        _temp: tempfile::TempDir,
        install_root: PathBuf,
        custom_dir: PathBuf,
        assets: BundledAssets,
        config: LauncherConfig,
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let install_root = temp.path().join("rblx-versions");
        let preset = temp.path().join("resources/skyboxes/Nebula");
        std::fs::create_dir_all(&preset).unwrap();
        for face in SKYBOX_FACES {
            std::fs::write(preset.join(face), face).unwrap();
        }
        let assets = BundledAssets::scan(&temp.path().join("resources"));

        let mut config = LauncherConfig::default();
        config.current_skybox = "Nebula".into();
        config
            .fast_flags
            .insert("FFlagA".into(), serde_json::json!(true));
        config.fast_flags.insert("FIntB".into(), serde_json::json!(3));

        Fixture {
            install_root,
            custom_dir: temp.path().join("custom-skybox"),
            assets,
            config,
            _temp: temp,
        }
    }

    fn context<'a>(
        fx: &'a Fixture,
        strategy: &'a dyn LaunchStrategy,
        fetcher: &'a dyn Fetcher,
        backend: &'a dyn StagingBackend,
        spawner: &'a dyn Spawner,
        events: &'a dyn EventSink,
    ) -> LaunchContext<'a> {
        LaunchContext {
            strategy,
            config: &fx.config,
            install_root: &fx.install_root,
            fetcher,
            backend,
            spawner,
            events,
            assets: &fx.assets,
            custom_skybox_dir: &fx.custom_dir,
            sober_config_path: None,
            vinegar_config_path: None,
            running_check: not_running,
        }
    }

    #[tokio::test]
    async fn empty_root_installs_stages_and_launches() {
        let fx = fixture();
        let cdn = FakeCdn::serving("v100");
        let backend =
            FsBackend::new(Platform::MacOs, vec![fx.install_root.clone()]).with_app_bundle(None);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &MacOsStrategy, &cdn, &backend, &spawner, &events);

        let report = launch(&ctx).await.unwrap();

        let installed = report.installed.unwrap();
        assert!(installed.freshly_installed);
        assert_eq!(installed.version_dir, fx.install_root.join("v100"));
        assert!(installed.executable.is_file());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&installed.executable)
                .unwrap()
                .permissions()
                .mode();
            assert_ne!(mode & 0o111, 0);
        }

        let bundle = installed.version_dir.join(MAC_PLAYER_BUNDLE);
        let flags: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(bundle.join("Contents/ClientSettings/ClientAppSettings.json"))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(flags["FFlagA"], "True");
        assert_eq!(flags["FIntB"], "3");

        let sky = bundle.join("Contents/Resources/PlatformContent/pc/textures/sky");
        for face in SKYBOX_FACES {
            assert!(sky.join(face).is_file(), "{} missing", face);
        }
        assert_eq!(report.staging.unwrap().faces_staged, 6);

        let spawned = spawner.spawned.lock().unwrap();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].program, "open");
        assert_eq!(spawned[0].args[1], bundle.to_string_lossy());

        let statuses = events.statuses.lock().unwrap();
        assert_eq!(statuses.first().map(String::as_str), Some("Checking for updates..."));
        assert_eq!(statuses.last().map(String::as_str), Some("Launching..."));
    }

    #[tokio::test]
    async fn stale_version_is_replaced() {
        let fx = fixture();
        std::fs::create_dir_all(fx.install_root.join("v99").join(MAC_PLAYER_BUNDLE)).unwrap();
        let cdn = FakeCdn::serving("v100");
        let backend =
            FsBackend::new(Platform::MacOs, vec![fx.install_root.clone()]).with_app_bundle(None);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &MacOsStrategy, &cdn, &backend, &spawner, &events);

        launch(&ctx).await.unwrap();

        let dirs: Vec<String> = std::fs::read_dir(&fx.install_root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(dirs, vec!["v100"]);
    }

    #[tokio::test]
    async fn second_launch_skips_download() {
        let fx = fixture();
        let cdn = FakeCdn::serving("v100");
        let backend =
            FsBackend::new(Platform::MacOs, vec![fx.install_root.clone()]).with_app_bundle(None);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &MacOsStrategy, &cdn, &backend, &spawner, &events);

        launch(&ctx).await.unwrap();
        let report = launch(&ctx).await.unwrap();

        assert!(!report.installed.unwrap().freshly_installed);
        assert_eq!(cdn.archive_requests(), 1);
        assert_eq!(spawner.spawned.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn disabled_updates_stop_before_download() {
        let mut fx = fixture();
        fx.config.auto_update = false;
        let cdn = FakeCdn::serving("v100");
        let backend =
            FsBackend::new(Platform::MacOs, vec![fx.install_root.clone()]).with_app_bundle(None);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &MacOsStrategy, &cdn, &backend, &spawner, &events);

        let err = launch(&ctx).await.unwrap_err();

        assert!(matches!(err, LauncherError::UpdateDisabled { .. }));
        assert_eq!(cdn.archive_requests(), 0);
        assert!(spawner.spawned.lock().unwrap().is_empty());
        assert_eq!(events.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolver_failure_is_fatal_and_notified() {
        let fx = fixture();
        let cdn = FakeCdn {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        };
        let backend =
            FsBackend::new(Platform::MacOs, vec![fx.install_root.clone()]).with_app_bundle(None);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &MacOsStrategy, &cdn, &backend, &spawner, &events);

        let err = launch(&ctx).await.unwrap_err();

        assert!(matches!(err, LauncherError::Network { .. }));
        assert!(spawner.spawned.lock().unwrap().is_empty());
        assert!(!events.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sandboxed_skips_resolution_and_still_launches_when_staging_fails() {
        let mut fx = fixture();
        fx.config.discord_rpc_enabled = true;
        fx.config.show_notifications = false;
        let cdn = FakeCdn {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        };
        let backend = FsBackend::new(Platform::LinuxSandboxed, Vec::new());
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        // No runtime config path: staging fails.
        let ctx = context(&fx, &SandboxedStrategy, &cdn, &backend, &spawner, &events);

        let report = launch(&ctx).await.unwrap();

        assert!(report.installed.is_none());
        assert!(report.staging.is_none());
        assert!(cdn.requests.lock().unwrap().is_empty());
        assert_eq!(report.descriptor.program, "flatpak");
        assert_eq!(
            events.presence.lock().unwrap().as_slice(),
            ["Launching Roblox".to_string()]
        );
        // Staging failures are shown even with notifications turned off.
        assert_eq!(events.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn studio_installs_into_its_own_root_and_opens() {
        let mut fx = fixture();
        fx.install_root = fx.install_root.with_file_name("rblx-studio-versions");
        fx.config.discord_rpc_enabled = true;
        fx.config
            .fast_flags_studio
            .insert("FFlagStudioX".into(), serde_json::json!(false));
        let cdn = FakeCdn::serving_studio("s7");
        let backend = FsBackend::new(Platform::Windows, vec![fx.install_root.clone()]);
        let spawner = RecordingSpawner::default();
        let events = RecordingEvents::default();
        let ctx = context(&fx, &WindowsStudioStrategy, &cdn, &backend, &spawner, &events);

        let report = launch(&ctx).await.unwrap();

        let installed = report.installed.unwrap();
        assert_eq!(installed.executable, fx.install_root.join("s7").join(WINDOWS_STUDIO_EXE));
        assert!(installed.version_dir.join("AppSettings.xml").is_file());

        let written: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(
                installed
                    .version_dir
                    .join("ClientSettings")
                    .join("ClientAppSettings.json"),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(written["FFlagStudioX"], "False");

        assert_eq!(report.descriptor.program, "cmd");
        assert!(!report.descriptor.args.iter().any(|a| a == "--app"));
        assert_eq!(
            events.presence.lock().unwrap().as_slice(),
            ["Launching Roblox Studio".to_string()]
        );
        assert_eq!(
            events.notifications.lock().unwrap().last().map(String::as_str),
            Some("Launching Roblox Studio...")
        );
    }

    #[test]
    fn overlapping_runs_on_one_root_are_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let first = InstallLock::acquire(temp.path()).unwrap();

        let err = InstallLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, LauncherError::LaunchInProgress(_)));

        drop(first);
        assert!(InstallLock::acquire(temp.path()).is_ok());
    }
}
