mod commands;
pub mod core;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::core::cleaner::CleanTarget;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::mods::FlagMode;
use crate::core::paths::{runtime_paths, RuntimePaths};
use crate::core::platform::Platform;
use crate::core::state::{AppState, LauncherConfig};

#[derive(Debug, Parser)]
#[command(name = "nullstrap", version, about = "Install, update, mod and launch Roblox")]
struct Cli {
    /// Use this directory instead of the platform data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Update if needed, apply mods and start the client.
    Launch,
    /// Update Studio if needed and start it.
    Studio,
    /// Update if needed without launching.
    Install,
    /// Write flags and skybox into the current installation.
    Stage,
    /// Delete old log and cache files.
    Clean {
        #[arg(long, default_value_t = 7)]
        max_age_days: u32,
        #[arg(long = "target", value_enum, default_values_t = [CleanTarget::Logs, CleanTarget::Cache])]
        targets: Vec<CleanTarget>,
    },
    /// Print the public catalog of known flags.
    Flags {
        #[arg(value_enum, default_value_t = FlagMode::Player)]
        mode: FlagMode,
    },
    /// Report whether the client or Studio is currently running.
    Status,
    /// Show settings, or change them with `--set key=json`.
    Settings {
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nullstrap_lib=debug")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_paths(data_dir: Option<PathBuf>) -> LauncherResult<RuntimePaths> {
    match data_dir {
        Some(dir) => Ok(RuntimePaths::with_data_dir(dir)),
        None => runtime_paths().cloned(),
    }
}

async fn dispatch(cli: Cli) -> LauncherResult<()> {
    let paths = resolve_paths(cli.data_dir)?;
    let config = LauncherConfig::load(&paths.settings_file());
    let platform = Platform::current()?;

    tracing::info!("nullstrap starting on {} ({:?})", platform, paths.data_dir());
    let state = Arc::new(Mutex::new(AppState::new(paths, config, platform)?));

    match cli.command {
        Command::Launch => {
            let report = commands::launch(&state).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Studio => {
            let report = commands::launch_studio(&state).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Install => match commands::ensure_installed(&state).await? {
            Some(installed) => println!("{}", serde_json::to_string_pretty(&installed)?),
            None => println!("Installation is managed by the {} runtime", platform),
        },
        Command::Stage => {
            commands::stage_mods(&state).await?;
        }
        Command::Clean {
            max_age_days,
            targets,
        } => {
            let removed = commands::run_cleaner(&state, max_age_days, &targets).await?;
            println!("Cleaned {} files.", removed);
        }
        Command::Flags { mode } => {
            let catalog = commands::fetch_flag_catalog(&state, mode).await?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Command::Status => {
            if commands::is_target_running() {
                let game = commands::current_game_name(&state).await;
                println!("Roblox is running ({})", game);
            } else {
                println!("Roblox is not running");
            }
        }
        Command::Settings { set } => {
            let mut config = commands::get_launcher_settings(&state).await;
            if !set.is_empty() {
                config = apply_overrides(&config, &set)?;
                commands::update_launcher_settings(&state, config.clone()).await?;
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Apply `key=value` pairs to the settings. Values are parsed as JSON and
/// fall back to plain strings.
fn apply_overrides(config: &LauncherConfig, pairs: &[String]) -> LauncherResult<LauncherConfig> {
    let mut document = serde_json::to_value(config)?;

    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| LauncherError::Other(format!("Expected KEY=VALUE, got {:?}", pair)))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        if let Some(object) = document.as_object_mut() {
            object.insert(key.to_string(), value);
        }
    }

    Ok(serde_json::from_value(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["nullstrap", "clean", "--max-age-days", "3", "--target", "logs"])
            .unwrap();
        match cli.command {
            Command::Clean {
                max_age_days,
                targets,
            } => {
                assert_eq!(max_age_days, 3);
                assert_eq!(targets, vec![CleanTarget::Logs]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::try_parse_from(["nullstrap", "flags", "studio"]).unwrap();
        assert!(matches!(cli.command, Command::Flags { mode: FlagMode::Studio }));

        let cli = Cli::try_parse_from(["nullstrap", "--data-dir", "/tmp/ns", "studio"]).unwrap();
        assert!(matches!(cli.command, Command::Studio));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/ns")));
    }

    #[test]
    fn overrides_are_typed_by_json() {
        let config = apply_overrides(
            &LauncherConfig::default(),
            &[
                "cpuCoreLimit=4".to_string(),
                "autoUpdate=false".to_string(),
                "currentSkybox=Purple Nebula".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(config.cpu_core_limit, 4);
        assert!(!config.auto_update);
        assert_eq!(config.current_skybox, "Purple Nebula");

        assert!(apply_overrides(&LauncherConfig::default(), &["nonsense".to_string()]).is_err());
    }
}
