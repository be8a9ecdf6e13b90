use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{Platform, SOBER_APP_ID, VINEGAR_APP_ID};

const APP_DIR_NAME: &str = "nullstrap";
const INSTALL_DIR_NAME: &str = "rblx-versions";
const STUDIO_INSTALL_DIR_NAME: &str = "rblx-studio-versions";
const CUSTOM_SKYBOX_DIR_NAME: &str = "custom-skybox";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// Every filesystem location the bootstrapper touches.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    data_dir: PathBuf,
    assets_dir: PathBuf,
    home_dir: Option<PathBuf>,
}

impl RuntimePaths {
    /// Paths rooted at explicit directories. Nothing is created.
    pub fn new(data_dir: PathBuf, assets_dir: PathBuf, home_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            assets_dir,
            home_dir,
        }
    }

    /// Host locations with the data directory replaced. Unlike
    /// [`runtime_paths`] this never creates the default data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self::new(data_dir, bundled_assets_dir(), dirs::home_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Holds one directory per installed version.
    pub fn install_root(&self) -> PathBuf {
        self.data_dir.join(INSTALL_DIR_NAME)
    }

    /// Studio versions, kept apart so each root retains exactly one version.
    pub fn studio_install_root(&self) -> PathBuf {
        self.data_dir.join(STUDIO_INSTALL_DIR_NAME)
    }

    pub fn custom_skybox_dir(&self) -> PathBuf {
        self.data_dir.join(CUSTOM_SKYBOX_DIR_NAME)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// `~/.var/app/org.vinegarhq.Sober/config/sober/config.json`
    pub fn sober_config_path(&self) -> Option<PathBuf> {
        self.home_dir.as_ref().map(|home| {
            home.join(".var")
                .join("app")
                .join(SOBER_APP_ID)
                .join("config")
                .join("sober")
                .join("config.json")
        })
    }

    /// `~/.var/app/org.vinegarhq.Vinegar/config/vinegar/config.toml`
    pub fn vinegar_config_path(&self) -> Option<PathBuf> {
        self.home_dir.as_ref().map(|home| {
            home.join(".var")
                .join("app")
                .join(VINEGAR_APP_ID)
                .join("config")
                .join("vinegar")
                .join("config.toml")
        })
    }

    /// Directories whose children are version directories that may receive
    /// flag files and textures.
    pub fn flag_search_roots(&self, platform: Platform) -> Vec<PathBuf> {
        let mut roots = Vec::new();

        if platform == Platform::Windows {
            for var in ["LOCALAPPDATA", "ProgramFiles(x86)", "ProgramFiles"] {
                if let Some(base) = std::env::var_os(var) {
                    roots.push(PathBuf::from(base).join("Roblox").join("Versions"));
                }
            }
        }

        roots.push(self.studio_install_root());
        roots.push(self.install_root());
        roots
    }

    pub fn log_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Roblox").join("logs"));
        }
        if let Some(home) = &self.home_dir {
            dirs.push(home.join("Library").join("Logs").join("Roblox"));
            dirs.push(
                home.join(".var")
                    .join("app")
                    .join(SOBER_APP_ID)
                    .join("data")
                    .join("sober")
                    .join("logs"),
            );
        }
        dirs
    }

    pub fn cache_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for var in ["TEMP", "TMPDIR"] {
            if let Some(temp) = std::env::var_os(var) {
                dirs.push(PathBuf::from(temp).join("Roblox"));
            }
        }
        if let Some(home) = &self.home_dir {
            dirs.push(home.join("Library").join("Caches").join("Roblox"));
            dirs.push(home.join(".cache").join("sober"));
        }
        dirs
    }
}

static RUNTIME_PATHS: OnceLock<RuntimePaths> = OnceLock::new();

/// Host paths, resolved once per process.
pub fn runtime_paths() -> LauncherResult<&'static RuntimePaths> {
    if let Some(paths) = RUNTIME_PATHS.get() {
        return Ok(paths);
    }

    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    let data_dir = canonical_or_create_dir(&data_dir)?;

    let paths = RuntimePaths::new(data_dir, bundled_assets_dir(), dirs::home_dir());

    let _ = RUNTIME_PATHS.set(paths);
    RUNTIME_PATHS
        .get()
        .ok_or_else(|| LauncherError::Other("runtime paths unavailable".into()))
}

/// `resources/` next to the executable, falling back to the source tree for
/// development builds.
fn bundled_assets_dir() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")));

    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources"),
    }
}

fn canonical_or_create_dir(path: &Path) -> LauncherResult<PathBuf> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::canonicalize(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}
