use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{Platform, MAC_PLAYER_BUNDLE, WINDOWS_PLAYER_EXE, WINDOWS_STUDIO_EXE};

use super::flags::FlagMode;

const FLAGS_FILE: &str = "ClientAppSettings.json";

/// Where staged mods end up. Both writes are idempotent and return how many
/// installations received the artifact.
#[async_trait]
pub trait StagingBackend: Send + Sync {
    async fn write_flags(
        &self,
        mode: FlagMode,
        flags: &BTreeMap<String, String>,
    ) -> LauncherResult<usize>;

    async fn write_texture(&self, filename: &str, bytes: &[u8]) -> LauncherResult<usize>;
}

/// Writes straight into every installation found under the search roots.
pub struct FsBackend {
    platform: Platform,
    search_roots: Vec<PathBuf>,
    /// A system-wide application bundle that also takes flag files (macOS).
    app_bundle: Option<PathBuf>,
}

impl FsBackend {
    pub fn new(platform: Platform, search_roots: Vec<PathBuf>) -> Self {
        let app_bundle = match platform {
            Platform::MacOs => Some(PathBuf::from("/Applications/Roblox.app")),
            _ => None,
        };
        Self {
            platform,
            search_roots,
            app_bundle,
        }
    }

    pub fn with_app_bundle(mut self, app_bundle: Option<PathBuf>) -> Self {
        self.app_bundle = app_bundle;
        self
    }

    /// Flag directories for `mode`, one per matching installation.
    async fn flag_dirs(&self, mode: FlagMode) -> LauncherResult<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        match (self.platform, mode) {
            (Platform::Windows, _) => {
                let marker = match mode {
                    FlagMode::Player => WINDOWS_PLAYER_EXE,
                    FlagMode::Studio => WINDOWS_STUDIO_EXE,
                };
                for version_dir in self.installations().await {
                    if version_dir.join(marker).exists() {
                        dirs.push(version_dir.join("ClientSettings"));
                    }
                }
            }
            (Platform::MacOs, FlagMode::Player) => {
                for version_dir in self.installations().await {
                    let bundle = version_dir.join(MAC_PLAYER_BUNDLE);
                    if bundle.exists() {
                        dirs.push(bundle.join("Contents").join("ClientSettings"));
                    }
                }
                if let Some(bundle) = self.app_bundle.as_ref().filter(|b| b.exists()) {
                    dirs.push(bundle.join("Contents").join("ClientSettings"));
                }
            }
            (Platform::MacOs, FlagMode::Studio) => {
                return Err(LauncherError::Unsupported("Studio flag overrides".into()));
            }
            (Platform::LinuxSandboxed, _) => {
                return Err(LauncherError::Unsupported(
                    "Writing flag files outside the sandboxed runtime".into(),
                ));
            }
        }
        Ok(dirs)
    }

    async fn texture_dirs(&self) -> LauncherResult<Vec<PathBuf>> {
        if self.platform == Platform::LinuxSandboxed {
            return Err(LauncherError::Unsupported("Skybox textures".into()));
        }

        let mut dirs = Vec::new();
        for version_dir in self.installations().await {
            let content_root = match self.platform {
                Platform::Windows => {
                    if !version_dir.join(WINDOWS_PLAYER_EXE).exists()
                        && !version_dir.join(WINDOWS_STUDIO_EXE).exists()
                    {
                        continue;
                    }
                    version_dir
                }
                Platform::MacOs => {
                    let bundle = version_dir.join(MAC_PLAYER_BUNDLE);
                    if !bundle.exists() {
                        continue;
                    }
                    bundle.join("Contents").join("Resources")
                }
                Platform::LinuxSandboxed => continue,
            };
            dirs.push(
                content_root
                    .join("PlatformContent")
                    .join("pc")
                    .join("textures")
                    .join("sky"),
            );
        }
        Ok(dirs)
    }

    /// Direct subdirectories of every existing search root.
    async fn installations(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for root in &self.search_roots {
            let Ok(mut entries) = tokio::fs::read_dir(root).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.is_dir() {
                    found.push(path);
                }
            }
        }
        found
    }
}

async fn write_into(dir: &Path, filename: &str, bytes: &[u8]) -> LauncherResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| LauncherError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| LauncherError::Io { path, source })
}

#[async_trait]
impl StagingBackend for FsBackend {
    async fn write_flags(
        &self,
        mode: FlagMode,
        flags: &BTreeMap<String, String>,
    ) -> LauncherResult<usize> {
        let json = serde_json::to_string_pretty(flags)?;
        let dirs = self.flag_dirs(mode).await?;

        for dir in &dirs {
            write_into(dir, FLAGS_FILE, json.as_bytes()).await?;
            debug!("Wrote {} {} flags to {:?}", flags.len(), mode, dir);
        }

        info!("Saved {} flags to {} installation(s)", mode, dirs.len());
        Ok(dirs.len())
    }

    async fn write_texture(&self, filename: &str, bytes: &[u8]) -> LauncherResult<usize> {
        let dirs = self.texture_dirs().await?;
        for dir in &dirs {
            write_into(dir, filename, bytes).await?;
        }
        debug!("Applied {} to {} location(s)", filename, dirs.len());
        Ok(dirs.len())
    }
}
