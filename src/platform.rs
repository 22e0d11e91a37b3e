//! Host OS detection and the OS-specific command lines behind each tool.
//!
//! Everything here is data: functions return argv vectors and never spawn
//! anything, so the tables can be checked without touching the system.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Unsupported(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            other => Platform::Unsupported(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unsupported(_))
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("Windows"),
            Platform::Linux => f.write_str("Linux"),
            Platform::Unsupported(os) => write!(f, "{os}"),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

// ── Cleanup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupTask {
    pub desc: String,
    pub argv: Vec<String>,
}

impl CleanupTask {
    fn new(desc: &str, parts: &[&str]) -> Self {
        Self { desc: desc.to_string(), argv: argv(parts) }
    }
}

const PS_QUIET: [&str; 2] = ["-ErrorAction", "SilentlyContinue"];

fn ps_remove(desc: &str, target: &str, recurse: bool) -> CleanupTask {
    let mut parts = vec!["powershell", "Remove-Item", target];
    if recurse {
        parts.push("-Recurse");
    }
    parts.push("-Force");
    parts.extend(PS_QUIET);
    CleanupTask::new(desc, &parts)
}

fn ps_stop_service(desc: &str, name: &str) -> CleanupTask {
    let mut parts = vec!["powershell", "Stop-Service", "-Name", name, "-Force"];
    parts.extend(PS_QUIET);
    CleanupTask::new(desc, &parts)
}

pub fn cleanup_tasks(platform: &Platform) -> Vec<CleanupTask> {
    match platform {
        Platform::Windows => vec![
            ps_stop_service("Stopping Windows Update service", "wuauserv"),
            ps_stop_service("Stopping BITS service", "bits"),
            ps_remove("Cleaning Prefetch", "C:\\Windows\\Prefetch\\*", true),
            ps_remove(
                "Cleaning Error Reporting",
                "$env:ProgramData\\Microsoft\\Windows\\WER\\*",
                true,
            ),
            ps_remove(
                "Cleaning Windows Update Cache",
                "C:\\Windows\\SoftwareDistribution\\Download\\*",
                true,
            ),
            ps_remove(
                "Cleaning Delivery Optimization",
                "$env:SystemDrive\\ProgramData\\Microsoft\\Network\\Downloader\\*",
                true,
            ),
            ps_remove(
                "Cleaning Thumbnail Cache",
                "$env:LOCALAPPDATA\\Microsoft\\Windows\\Explorer\\thumbcache_*",
                false,
            ),
            CleanupTask::new(
                "Cleaning Recycle Bin",
                &[
                    "powershell",
                    "(New-Object -ComObject Shell.Application).NameSpace(10).Items() | \
                     ForEach-Object { Remove-Item $_.Path -Force -Recurse -ErrorAction SilentlyContinue }",
                ],
            ),
            CleanupTask::new(
                "Cleaning Temp Files",
                &[
                    "powershell",
                    "-Command",
                    "Get-ChildItem -Path $env:TEMP | \
                     ForEach-Object { Remove-Item $_.FullName -Recurse -Force -ErrorAction SilentlyContinue }",
                ],
            ),
            ps_remove(
                "Cleaning Windows Temp Files",
                "$env:LOCALAPPDATA\\Microsoft\\Windows\\Caches\\*",
                true,
            ),
            CleanupTask::new("Flushing DNS Cache", &["ipconfig", "/flushdns"]),
        ],
        Platform::Linux => vec![
            CleanupTask::new("Cleaning Thumbnail Cache", &["sh", "-c", "rm -rf ~/.cache/thumbnails/*"]),
            CleanupTask::new("Cleaning System Logs >60 days", &["journalctl", "--vacuum-time=60d"]),
            CleanupTask::new("Cleaning Trash", &["sh", "-c", "rm -rf ~/.local/share/Trash/*"]),
            CleanupTask::new("Cleaning Temp Files", &["sh", "-c", "rm -rf /tmp/*"]),
            CleanupTask::new("Cleaning Apt Cache", &["sudo", "apt-get", "clean"]),
            CleanupTask::new("Cleaning Flatpak Cache", &["flatpak", "uninstall", "--unused", "-y"]),
            CleanupTask::new("Cleaning Snap Cache", &["sh", "-c", "rm -rf /var/cache/snapd/*"]),
            CleanupTask::new("Cleaning DNF Cache", &["sh", "-c", "rm -rf /var/cache/dnf/*"]),
            CleanupTask::new("Cleaning Pacman Cache", &["sh", "-c", "rm -rf /var/cache/pacman/pkg/*"]),
            CleanupTask::new("Running Nix Garbage Collector", &["nix-collect-garbage", "-d"]),
        ],
        Platform::Unsupported(_) => Vec::new(),
    }
}

// ── Power ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Reboot,
    /// Reboot straight into the BIOS/UEFI setup screen.
    Firmware,
}

impl PowerAction {
    pub fn label(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
            PowerAction::Firmware => "reboot to BIOS",
        }
    }
}

pub fn power_command(platform: &Platform, action: PowerAction) -> Option<Vec<String>> {
    let parts: &[&str] = match (platform, action) {
        (Platform::Windows, PowerAction::Shutdown) => &["shutdown", "/s", "/f", "/t", "0"],
        (Platform::Windows, PowerAction::Reboot) => &["shutdown", "/r", "/f", "/t", "0"],
        (Platform::Windows, PowerAction::Firmware) => &["shutdown", "/r", "/fw", "/t", "0"],
        (Platform::Linux, PowerAction::Shutdown) => &["shutdown", "-h", "now"],
        (Platform::Linux, PowerAction::Reboot) => &["shutdown", "-r", "now"],
        (Platform::Linux, PowerAction::Firmware) => &["systemctl", "reboot", "--firmware-setup"],
        (Platform::Unsupported(_), _) => return None,
    };
    Some(argv(parts))
}

// ── Display manager ───────────────────────────────────────────────────────────

pub fn restart_dm_command(dm: &str) -> Vec<String> {
    argv(&["systemctl", "restart", dm])
}

/// Last resort when no known display manager restarts: hang up the session.
pub fn session_hangup_commands() -> Vec<Vec<String>> {
    vec![argv(&["pkill", "-HUP", "Xorg"]), argv(&["pkill", "-HUP", "wayland"])]
}

pub fn explorer_kill_command() -> Vec<String> {
    argv(&["taskkill", "/f", "/im", "explorer.exe"])
}

pub fn explorer_start_command() -> Vec<String> {
    argv(&["explorer.exe"])
}

// ── Clipboard ─────────────────────────────────────────────────────────────────

/// Clipboard readers in preference order. The first one found on PATH wins.
pub fn clipboard_readers(platform: &Platform) -> Vec<Vec<String>> {
    match platform {
        Platform::Windows => vec![argv(&["powershell", "-command", "Get-Clipboard"])],
        Platform::Linux => vec![
            argv(&["xclip", "-o", "-selection", "clipboard"]),
            argv(&["xsel", "--clipboard", "--output"]),
            argv(&["wl-paste", "--no-newline"]),
        ],
        Platform::Unsupported(_) => Vec::new(),
    }
}

// ── Privileges ────────────────────────────────────────────────────────────────

/// `net session` only succeeds for administrators.
pub fn windows_admin_check() -> Vec<String> {
    argv(&["net", "session"])
}

pub fn windows_elevate_command(exe: &str) -> Vec<String> {
    argv(&["powershell", "-Command", "Start-Process", exe, "-Verb", "RunAs"])
}

pub fn sudo_relaunch_command(exe: &str, args: &[String]) -> Vec<String> {
    let mut cmd = argv(&["sudo", exe]);
    cmd.extend(args.iter().cloned());
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_and_unknown_systems() {
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        let mac = Platform::from_os("macos");
        assert!(!mac.is_supported());
        assert_eq!(mac.to_string(), "macos");
    }

    #[test]
    fn cleanup_tables_have_expected_shape() {
        let linux = cleanup_tasks(&Platform::Linux);
        assert_eq!(linux.len(), 10);
        assert_eq!(linux[1].argv, vec!["journalctl", "--vacuum-time=60d"]);
        assert_eq!(linux.last().unwrap().desc, "Running Nix Garbage Collector");

        let windows = cleanup_tasks(&Platform::Windows);
        assert_eq!(windows.len(), 11);
        assert_eq!(windows.last().unwrap().argv, vec!["ipconfig", "/flushdns"]);
        assert!(windows.iter().all(|t| !t.argv.is_empty()));

        assert!(cleanup_tasks(&Platform::Unsupported("haiku".into())).is_empty());
    }

    #[test]
    fn powershell_removals_stay_quiet() {
        let windows = cleanup_tasks(&Platform::Windows);
        let prefetch = windows.iter().find(|t| t.desc == "Cleaning Prefetch").unwrap();
        assert_eq!(&prefetch.argv[prefetch.argv.len() - 2..], &["-ErrorAction", "SilentlyContinue"]);
        assert!(prefetch.argv.contains(&"-Recurse".to_string()));

        let thumbs = windows.iter().find(|t| t.desc == "Cleaning Thumbnail Cache").unwrap();
        assert!(!thumbs.argv.contains(&"-Recurse".to_string()));
    }

    #[test]
    fn power_commands_per_platform() {
        assert_eq!(
            power_command(&Platform::Linux, PowerAction::Reboot).unwrap(),
            vec!["shutdown", "-r", "now"]
        );
        assert_eq!(
            power_command(&Platform::Windows, PowerAction::Shutdown).unwrap(),
            vec!["shutdown", "/s", "/f", "/t", "0"]
        );
        assert_eq!(
            power_command(&Platform::Linux, PowerAction::Firmware).unwrap(),
            vec!["systemctl", "reboot", "--firmware-setup"]
        );
        assert!(power_command(&Platform::Unsupported("x".into()), PowerAction::Shutdown).is_none());
    }

    #[test]
    fn sudo_relaunch_keeps_arguments() {
        let cmd = sudo_relaunch_command("/usr/bin/crunchyutils", &["--skip".to_string()]);
        assert_eq!(cmd, vec!["sudo", "/usr/bin/crunchyutils", "--skip"]);
    }

    #[test]
    fn xclip_is_preferred_on_linux() {
        let readers = clipboard_readers(&Platform::Linux);
        assert_eq!(readers[0][0], "xclip");
        assert_eq!(readers[1][0], "xsel");
    }
}
