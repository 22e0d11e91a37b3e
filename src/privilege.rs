//! Administrator / root elevation. Runs before the TUI starts so `sudo` and
//! UAC prompts get a normal terminal.

use crate::platform::{sudo_relaunch_command, windows_admin_check, windows_elevate_command, Platform};
use crate::shell::{run_inherited, run_quiet};

#[derive(Debug, PartialEq, Eq)]
pub enum Elevation {
    /// Already root or administrator.
    Privileged,
    /// An elevated copy ran and exited cleanly; this instance should stop.
    Relaunched,
    Failed(String),
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

pub fn is_privileged(platform: &Platform) -> bool {
    match platform {
        Platform::Windows => run_quiet(&windows_admin_check()),
        _ => is_root(),
    }
}

/// The command that restarts this program with elevated rights.
pub fn relaunch_command(platform: &Platform, exe: &str, args: &[String]) -> Vec<String> {
    match platform {
        Platform::Windows => windows_elevate_command(exe),
        _ => sudo_relaunch_command(exe, args),
    }
}

pub fn ensure_privileged(platform: &Platform) -> Elevation {
    if is_privileged(platform) {
        return Elevation::Privileged;
    }

    let exe = match std::env::current_exe() {
        Ok(exe) => exe.to_string_lossy().into_owned(),
        Err(e) => return Elevation::Failed(format!("Executable not found: {e}")),
    };
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cmd = relaunch_command(platform, &exe, &args);

    if platform.is_windows() {
        eprintln!("[INFO] Restarting as admin...");
    } else {
        eprintln!("[INFO] Requesting root privileges...");
    }
    tracing::info!(command = %cmd.join(" "), "relaunching with elevated rights");

    match run_inherited(&cmd) {
        Ok(status) if status.success() => Elevation::Relaunched,
        Ok(status) => Elevation::Failed(format!("Failed to restart as admin: {status}")),
        Err(e) => Elevation::Failed(format!("Failed to restart as admin: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_relaunch_keeps_arguments() {
        let args = vec!["--skip".to_string(), "--no-init".to_string()];
        assert_eq!(
            relaunch_command(&Platform::Linux, "/usr/bin/crunchyutils", &args),
            vec!["sudo", "/usr/bin/crunchyutils", "--skip", "--no-init"]
        );
    }

    #[test]
    fn windows_relaunch_goes_through_runas() {
        let cmd = relaunch_command(&Platform::Windows, "C:\\cu.exe", &[]);
        assert_eq!(cmd[0], "powershell");
        assert!(cmd.iter().any(|a| a == "RunAs"));
        assert!(cmd.iter().any(|a| a == "C:\\cu.exe"));
    }
}
