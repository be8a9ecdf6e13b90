use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Merge launcher settings and flags into the sandboxed runtime's config.
///
/// Keys the launcher does not manage are preserved. `settings` are applied
/// on top of the existing document, then `fflags` is replaced wholesale.
pub async fn merge_sober_config(
    path: &Path,
    settings: &Map<String, Value>,
    flags: &BTreeMap<String, String>,
) -> LauncherResult<()> {
    let mut document = match tokio::fs::read_to_string(path).await {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("Replacing unreadable runtime config at {:?}", path);
                Map::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| LauncherError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            Map::new()
        }
        Err(source) => {
            return Err(LauncherError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for (key, value) in settings {
        document.insert(key.clone(), value.clone());
    }

    let fflags: Map<String, Value> = flags
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    document.insert("fflags".into(), Value::Object(fflags));

    let json = serde_json::to_string_pretty(&Value::Object(document))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Saved {} flags to runtime config {:?}", flags.len(), path);
    Ok(())
}
