use crate::platform::Platform;
use crate::shell::command_exists;

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub warnings: Vec<String>,
}

/// Optional tools: (any of these binaries, what needs them)
type ToolGroup = (&'static [&'static str], &'static str);

const LINUX_TOOLS: &[ToolGroup] = &[
    (&["xclip", "xsel", "wl-paste"], "clipboard logger"),
    (&["systemctl"], "display-manager restart, reboot to BIOS"),
    (&["journalctl"], "journal cleanup"),
    (&["nslookup"], "nameserver and MX lookups"),
    (&["notify-send"], "desktop notifications"),
];

const WINDOWS_TOOLS: &[ToolGroup] = &[
    (&["powershell"], "clipboard logger, notifications, elevation"),
    (&["nslookup"], "nameserver and MX lookups"),
];

pub fn tool_groups(platform: &Platform) -> &'static [ToolGroup] {
    match platform {
        Platform::Linux => LINUX_TOOLS,
        Platform::Windows => WINDOWS_TOOLS,
        Platform::Unsupported(_) => &[],
    }
}

/// Warnings for every group with none of its binaries present.
pub fn missing_tools(groups: &[ToolGroup], exists: impl Fn(&str) -> bool) -> Vec<String> {
    groups
        .iter()
        .filter(|(bins, _)| !bins.iter().any(|&b| exists(b)))
        .map(|(bins, desc)| format!("'{}' not found ({desc})", bins.join("' / '")))
        .collect()
}

pub fn run_preflight(platform: &Platform) -> PreflightReport {
    let warnings = missing_tools(tool_groups(platform), command_exists);
    for w in &warnings {
        tracing::warn!(warning = %w, "optional tool missing");
    }
    PreflightReport { warnings }
}

pub fn print_preflight(report: &PreflightReport) {
    if report.warnings.is_empty() {
        return;
    }
    eprintln!("\n╔══════════════════════════════════════════════════╗");
    eprintln!("║   CrunchyUtils - Optional Dependencies Missing   ║");
    eprintln!("╚══════════════════════════════════════════════════╝");
    for w in &report.warnings {
        eprintln!("  ! {w}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_member_satisfies_a_group() {
        let present = |b: &str| b == "wl-paste" || b == "systemctl";
        let missing = missing_tools(LINUX_TOOLS, present);
        assert_eq!(missing.len(), 3);
        assert!(missing.iter().all(|m| !m.contains("clipboard")));
        assert!(missing.iter().any(|m| m.starts_with("'nslookup' not found")));
    }

    #[test]
    fn group_names_are_listed_together() {
        let missing = missing_tools(LINUX_TOOLS, |_| false);
        assert_eq!(missing[0], "'xclip' / 'xsel' / 'wl-paste' not found (clipboard logger)");
    }

    #[test]
    fn unsupported_platforms_check_nothing() {
        assert!(tool_groups(&Platform::Unsupported("aix".into())).is_empty());
    }
}
