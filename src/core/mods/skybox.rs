// ─── Skybox Textures ───
// Resolves the configured skybox to six face textures, either from the
// bundled presets or from a folder the user filled in themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Face filenames, in the order they are staged.
pub const SKYBOX_FACES: [&str; 6] = [
    "sky512_bk.tex",
    "sky512_dn.tex",
    "sky512_ft.tex",
    "sky512_lf.tex",
    "sky512_rt.tex",
    "sky512_up.tex",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkyboxSelection {
    None,
    Preset(String),
    CustomDir(PathBuf),
}

impl SkyboxSelection {
    /// Interpret the `currentSkybox` setting.
    ///
    /// `"custom"` selects the user's custom skybox folder and an absolute path
    /// selects that folder. Any other path-like value is reduced to its last
    /// segment and treated as a preset name.
    pub fn parse(raw: &str, custom_dir: &Path) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            return SkyboxSelection::None;
        }
        if raw == "custom" {
            return SkyboxSelection::CustomDir(custom_dir.to_path_buf());
        }
        if Path::new(raw).is_absolute() {
            return SkyboxSelection::CustomDir(PathBuf::from(raw));
        }

        let name = raw
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(raw);
        SkyboxSelection::Preset(name.to_string())
    }

    /// Bytes of one face, or `None` when this selection has no such face.
    pub async fn read_face(
        &self,
        face: &str,
        assets: &BundledAssets,
    ) -> LauncherResult<Option<Vec<u8>>> {
        let path = match self {
            SkyboxSelection::None => return Ok(None),
            SkyboxSelection::CustomDir(dir) => dir.join(face),
            SkyboxSelection::Preset(name) => match assets.find_preset_face(name, face) {
                Some(path) => path,
                None => {
                    warn!("Texture {} not bundled for skybox {}", face, name);
                    return Ok(None);
                }
            },
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Skybox texture not found: {:?}", path);
                Ok(None)
            }
            Err(source) => Err(LauncherError::Io { path, source }),
        }
    }
}

/// Files shipped in the `resources/` directory, indexed by their storage
/// path (`/skyboxes/<Preset>/<face>`).
#[derive(Debug, Clone, Default)]
pub struct BundledAssets {
    entries: BTreeMap<String, PathBuf>,
}

impl BundledAssets {
    /// Index every file under `root`. A missing root yields an empty index.
    pub fn scan(root: &Path) -> Self {
        let mut entries = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let Ok(read_dir) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(root) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .fold(String::new(), |mut key, part| {
                            key.push('/');
                            key.push_str(&part);
                            key
                        });
                    entries.insert(key, path);
                }
            }
        }

        debug!("Indexed {} bundled assets under {:?}", entries.len(), root);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact storage path first, then a case-insensitive match on the preset
    /// directory and face name.
    pub fn find_preset_face(&self, preset: &str, face: &str) -> Option<PathBuf> {
        let exact = format!("/skyboxes/{}/{}", preset, face);
        if let Some(path) = self.entries.get(&exact) {
            return Some(path.clone());
        }

        let dir_marker = format!("/skyboxes/{}/", preset.to_lowercase());
        let face = face.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                key.contains(&dir_marker) && key.ends_with(&face)
            })
            .map(|(_, path)| path.clone())
    }
}
