use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Studio flags as native TOML values. Vinegar keeps types, so booleans and
/// numbers are not turned into text here.
pub fn toml_flags(flags: &BTreeMap<String, Value>) -> toml::Table {
    let mut table = toml::Table::new();
    for (name, value) in flags {
        let converted = match value {
            Value::Bool(b) => toml::Value::Boolean(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => toml::Value::Integer(i),
                (None, Some(f)) => toml::Value::Float(f),
                (None, None) => {
                    warn!("Skipping flag {} with out-of-range value {}", name, n);
                    continue;
                }
            },
            Value::String(s) => toml::Value::String(s.clone()),
            other => {
                warn!("Skipping flag {} with unsupported value {}", name, other);
                continue;
            }
        };
        table.insert(name.clone(), converted);
    }
    table
}

/// Replace the `fflags` table of Vinegar's `config.toml`, keeping every
/// other setting. A missing file is created; an unparsable one is left
/// alone and reported.
pub async fn merge_vinegar_config(path: &Path, flags: &BTreeMap<String, Value>) -> LauncherResult<()> {
    let mut document = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw
            .parse::<toml::Table>()
            .map_err(|e| LauncherError::Toml(format!("{}: {}", path.display(), e)))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| LauncherError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            toml::Table::new()
        }
        Err(source) => {
            return Err(LauncherError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let fflags = toml_flags(flags);
    let count = fflags.len();
    document.insert("fflags".into(), toml::Value::Table(fflags));

    let text = toml::to_string(&document).map_err(|e| LauncherError::Toml(e.to_string()))?;
    tokio::fs::write(path, text)
        .await
        .map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Saved {} studio flags to {:?}", count, path);
    Ok(())
}
