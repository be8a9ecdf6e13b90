use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;

const TARGET_PROCESS_NAMES: [&str; 4] = [
    "robloxplayerbeta",
    "robloxplayer",
    "robloxstudiobeta",
    "robloxstudio",
];

/// Whether a process name belongs to the client or Studio.
pub fn matches_target_process(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    TARGET_PROCESS_NAMES.iter().any(|target| name.contains(target))
}

/// Scan the process table for a running client or Studio.
pub fn is_target_running() -> bool {
    let running = process_table()
        .processes()
        .values()
        .any(|process| matches_target_process(&process.name().to_string_lossy()));
    debug!("Target program running: {}", running);
    running
}

/// Only the process list is loaded; CPU, memory and disk stay unscanned.
fn process_table() -> System {
    System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_name_matching() {
        assert!(matches_target_process("RobloxPlayerBeta.exe"));
        assert!(matches_target_process("RobloxPlayer"));
        assert!(matches_target_process("RobloxStudioBeta.exe"));
        assert!(!matches_target_process("nullstrap"));
        assert!(!matches_target_process("explorer.exe"));
    }

    #[test]
    fn process_only_refresh_sees_this_process() {
        let system = process_table();
        let me = sysinfo::Pid::from_u32(std::process::id());
        assert!(system.process(me).is_some());
    }
}
