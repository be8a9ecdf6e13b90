// ─── Launch Task ───
// Builds the platform command line for the client and spawns it without
// waiting for it to exit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{SOBER_APP_ID, VINEGAR_APP_ID};

/// A fully resolved command line. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchDescriptor {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl LaunchDescriptor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `cmd /C start "" [/affinity <mask>] /D <dir> <exe> --app`
    pub fn windows_start(executable: &Path, affinity: Option<u64>) -> LauncherResult<Self> {
        Ok(Self::windows_command(executable, affinity)?.arg("--app"))
    }

    /// `cmd /C start "" /D <dir> <exe>`, used for Studio.
    pub fn windows_open(executable: &Path) -> LauncherResult<Self> {
        Self::windows_command(executable, None)
    }

    fn windows_command(executable: &Path, affinity: Option<u64>) -> LauncherResult<Self> {
        let version_dir = executable.parent().ok_or_else(|| {
            LauncherError::Other(format!("Executable {:?} has no parent directory", executable))
        })?;

        let mut descriptor = Self::new("cmd").arg("/C").arg("start").arg("");
        if let Some(mask) = affinity {
            descriptor = descriptor.arg("/affinity").arg(format!("{:x}", mask));
        }
        let mut descriptor = descriptor
            .arg("/D")
            .arg(display_path(version_dir))
            .arg(display_path(executable));
        descriptor.current_dir = Some(version_dir.to_path_buf());
        Ok(descriptor)
    }

    /// `open -a <bundle>`; the OS resolves the inner binary.
    pub fn macos_open(bundle: &Path) -> Self {
        Self::new("open").arg("-a").arg(display_path(bundle))
    }

    /// `flatpak run org.vinegarhq.Sober`
    pub fn sandboxed_runtime() -> Self {
        Self::flatpak(SOBER_APP_ID)
    }

    /// `flatpak run org.vinegarhq.Vinegar`
    pub fn sandboxed_studio() -> Self {
        Self::flatpak(VINEGAR_APP_ID)
    }

    fn flatpak(app_id: &str) -> Self {
        Self::new("flatpak").arg("run").arg(app_id)
    }

    /// Copy/paste friendly rendering for the logs.
    pub fn to_command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| shell_escape(part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Bit mask selecting the lowest `cores` logical CPUs; `None` means no limit.
pub fn affinity_mask(cores: u32) -> Option<u64> {
    match cores {
        0 => None,
        n if n >= 64 => Some(u64::MAX),
        n => Some((1u64 << n) - 1),
    }
}

/// What the launcher learns about a spawned child: only that it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchedProcess {
    pub pid: u32,
}

/// Process boundary of the pipeline.
pub trait Spawner: Send + Sync {
    fn spawn(&self, descriptor: &LaunchDescriptor) -> LauncherResult<LaunchedProcess>;
}

/// Spawns real processes. Output is discarded and the child is not waited on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, descriptor: &LaunchDescriptor) -> LauncherResult<LaunchedProcess> {
        let mut cmd = std::process::Command::new(&descriptor.program);
        cmd.args(&descriptor.args);
        if let Some(dir) = &descriptor.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        configure_platform_spawn(&mut cmd);

        info!("Launching {}", descriptor.program);
        debug!("Command (copy/paste): {}", descriptor.to_command_line());

        let child = cmd.spawn().map_err(|e| LauncherError::Spawn {
            program: descriptor.program.clone(),
            reason: e.to_string(),
        })?;

        Ok(LaunchedProcess { pid: child.id() })
    }
}

fn configure_platform_spawn(cmd: &mut std::process::Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

/// Path text without the Windows extended-length prefix, which `start`
/// does not understand.
pub fn display_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    match text.strip_prefix(r"\\?\") {
        Some(stripped) => stripped.to_string(),
        None => text.to_string(),
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_masks() {
        assert_eq!(affinity_mask(0), None);
        assert_eq!(affinity_mask(1), Some(0x1));
        assert_eq!(affinity_mask(4), Some(0xF));
        assert_eq!(format!("{:x}", affinity_mask(4).unwrap()), "f");
        assert_eq!(affinity_mask(64), Some(u64::MAX));
        assert_eq!(affinity_mask(200), Some(u64::MAX));
    }

    #[test]
    fn windows_start_with_and_without_affinity() {
        let exe = Path::new("C:/Data/rblx-versions/v100/RobloxPlayerBeta.exe");

        let limited = LaunchDescriptor::windows_start(exe, affinity_mask(4)).unwrap();
        assert_eq!(limited.program, "cmd");
        assert_eq!(
            limited.args,
            vec![
                "/C",
                "start",
                "",
                "/affinity",
                "f",
                "/D",
                "C:/Data/rblx-versions/v100",
                "C:/Data/rblx-versions/v100/RobloxPlayerBeta.exe",
                "--app",
            ]
        );

        assert_eq!(
            limited.current_dir.as_deref(),
            Some(Path::new("C:/Data/rblx-versions/v100"))
        );

        let open = LaunchDescriptor::windows_start(exe, None).unwrap();
        assert!(!open.args.iter().any(|a| a == "/affinity"));
        assert_eq!(open.args[3], "/D");
    }

    #[test]
    fn studio_opens_without_client_flags() {
        let exe = Path::new("C:/Data/rblx-studio-versions/v7/RobloxStudioBeta.exe");
        let studio = LaunchDescriptor::windows_open(exe).unwrap();
        assert_eq!(
            studio.args,
            vec![
                "/C",
                "start",
                "",
                "/D",
                "C:/Data/rblx-studio-versions/v7",
                "C:/Data/rblx-studio-versions/v7/RobloxStudioBeta.exe",
            ]
        );
        assert!(studio.current_dir.is_some());

        assert_eq!(
            LaunchDescriptor::sandboxed_studio().to_command_line(),
            "flatpak run org.vinegarhq.Vinegar"
        );
    }

    #[test]
    fn mac_and_sandboxed_descriptors() {
        let mac = LaunchDescriptor::macos_open(Path::new("/data/v100/RobloxPlayer.app"));
        assert_eq!(mac.to_command_line(), "open -a /data/v100/RobloxPlayer.app");

        let sober = LaunchDescriptor::sandboxed_runtime();
        assert_eq!(sober.to_command_line(), "flatpak run org.vinegarhq.Sober");
    }

    #[test]
    fn extended_length_prefix_is_stripped() {
        assert_eq!(
            display_path(Path::new(r"\\?\C:\Roblox\v100")),
            r"C:\Roblox\v100"
        );
    }

    #[test]
    fn command_line_quotes_spaces_and_empty_args() {
        let descriptor = LaunchDescriptor::new("cmd").arg("").arg("Program Files");
        assert_eq!(descriptor.to_command_line(), "cmd \"\" \"Program Files\"");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = SystemSpawner
            .spawn(&LaunchDescriptor::new("definitely-not-a-real-program-4242"))
            .unwrap_err();
        assert!(matches!(err, LauncherError::Spawn { .. }));
    }
}
