//! System metrics for the banner, status bar and live monitor.

use std::path::Path;
use sysinfo::{Disks, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Name prefixes that are never interesting in a "top tasks" list.
const HIDDEN_PROCESS_PREFIXES: &[&str] = &["system", "svchost", "init", "systemd", "idle"];

const BAR_CELLS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DiskSummary {
    pub mount_point: String,
    pub total_gb: f64,
    pub used_percent: f64,
}

impl Default for DiskSummary {
    fn default() -> Self {
        Self { mount_point: "Unknown".into(), total_gb: 0.0, used_percent: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cpu_cores: usize,
    pub cpu_percent: f32,
    pub top_tasks: Vec<String>,
    pub ram_total_mb: u64,
    pub ram_percent: f64,
    pub disk: DiskSummary,
}

// ── Sampler ───────────────────────────────────────────────────────────────────

/// Keeps one `System` alive across refreshes. CPU figures are deltas
/// between consecutive refreshes, so `new` waits one minimum update
/// interval after priming and the first sample already reads true.
pub struct Sampler {
    sys: System,
    top_n: usize,
    self_name: String,
}

impl Sampler {
    pub fn new(top_n: usize) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        Self { sys, top_n, self_name: own_binary_name() }
    }

    pub fn sample(&mut self) -> Snapshot {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let procs = self.sys.processes().values().map(|p| {
            (p.name().to_string_lossy().into_owned(), p.cpu_usage())
        });
        let top_tasks = pick_top_processes(procs, self.top_n, &self.self_name);

        Snapshot {
            cpu_cores: self.sys.cpus().len(),
            cpu_percent: self.sys.global_cpu_usage(),
            top_tasks,
            ram_total_mb: self.sys.total_memory() / 1024 / 1024,
            ram_percent: percent(self.sys.used_memory(), self.sys.total_memory()),
            disk: disk_summary(),
        }
    }
}

fn own_binary_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().to_lowercase()))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

// ── One-shot readings ─────────────────────────────────────────────────────────

pub fn ram_usage_percent() -> f64 {
    let mut sys = System::new();
    sys.refresh_memory();
    percent(sys.used_memory(), sys.total_memory())
}

pub fn uptime() -> String {
    format_uptime(System::uptime())
}

pub fn disk_summary() -> DiskSummary {
    let disks = Disks::new_with_refreshed_list();
    let Some(disk) = disks.list().first() else {
        return DiskSummary::default();
    };
    let total = disk.total_space();
    let used = total.saturating_sub(disk.available_space());
    DiskSummary {
        mount_point: disk.mount_point().to_string_lossy().into_owned(),
        total_gb: total as f64 / 1024.0 / 1024.0 / 1024.0,
        used_percent: percent(used, total),
    }
}

/// Used bytes on the partition that holds `path`.
pub fn partition_used_bytes(path: &Path) -> Option<u64> {
    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<&Path> = disks.list().iter().map(|d| d.mount_point()).collect();
    let mount = mount_for(path, &mounts)?;
    let disk = disks.list().iter().find(|d| d.mount_point() == mount)?;
    Some(disk.total_space().saturating_sub(disk.available_space()))
}

/// The deepest mount point containing `path`.
pub fn mount_for<'a>(path: &Path, mounts: &[&'a Path]) -> Option<&'a Path> {
    mounts
        .iter()
        .copied()
        .filter(|m| path.starts_with(m))
        .max_by_key(|m| m.as_os_str().len())
}

// ── Formatting ────────────────────────────────────────────────────────────────

pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn format_uptime(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    if h > 999 {
        return "+999H".to_string();
    }
    format!("{h}H:{m:02}M")
}

pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}

/// `[███░░░░░░░]` style bar, ten cells wide.
pub fn usage_bar(percent: f64) -> String {
    let clamped = if percent.is_finite() { percent.max(0.0) } else { 0.0 };
    let filled = ((clamped.round() as usize) * BAR_CELLS / 100).min(BAR_CELLS);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

fn shorten_name(name: &str) -> String {
    if name.chars().count() > 18 {
        let head: String = name.chars().take(15).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Busiest processes by CPU, deduplicated by display name and padded with
/// `...` to exactly `n` rows.
pub fn pick_top_processes<I>(procs: I, n: usize, self_name: &str) -> Vec<String>
where
    I: IntoIterator<Item = (String, f32)>,
{
    let self_name = self_name.to_lowercase();
    let mut list: Vec<(String, f32)> = procs
        .into_iter()
        .filter(|(name, cpu)| !name.is_empty() && *cpu > 0.0)
        .filter(|(name, _)| {
            let lower = name.to_lowercase();
            !HIDDEN_PROCESS_PREFIXES.iter().any(|p| lower.starts_with(p))
                && !(!self_name.is_empty() && lower.starts_with(&self_name))
        })
        .map(|(name, cpu)| (shorten_name(&name), cpu))
        .collect();

    list.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut top: Vec<String> = Vec::with_capacity(n);
    for (name, _) in list {
        if top.len() == n {
            break;
        }
        if !top.contains(&name) {
            top.push(name);
        }
    }
    while top.len() < n {
        top.push("...".to_string());
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procs(items: &[(&str, f32)]) -> Vec<(String, f32)> {
        items.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn sampler_is_primed_for_a_full_cpu_interval() {
        let start = std::time::Instant::now();
        let mut sampler = Sampler::new(3);
        assert!(start.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL);

        let snap = sampler.sample();
        assert!(snap.cpu_cores > 0);
        assert_eq!(snap.top_tasks.len(), 3);
        assert!(snap.ram_total_mb > 0);
    }

    #[test]
    fn uptime_formats_hours_and_minutes() {
        assert_eq!(format_uptime(0), "0H:00M");
        assert_eq!(format_uptime(12 * 3600 + 34 * 60 + 59), "12H:34M");
        assert_eq!(format_uptime(999 * 3600), "999H:00M");
        assert_eq!(format_uptime(1000 * 3600), "+999H");
    }

    #[test]
    fn bars_fill_in_tenths() {
        assert_eq!(usage_bar(0.0), "[░░░░░░░░░░]");
        assert_eq!(usage_bar(58.0), "[█████░░░░░]");
        assert_eq!(usage_bar(100.0), "[██████████]");
        assert_eq!(usage_bar(250.0), "[██████████]");
        assert_eq!(usage_bar(f64::NAN), "[░░░░░░░░░░]");
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(format_percent(percent(1, 4)), "25%");
    }

    #[test]
    fn top_processes_sorted_filtered_and_padded() {
        let top = pick_top_processes(
            procs(&[
                ("firefox", 12.0),
                ("systemd-journald", 50.0),
                ("Idle", 90.0),
                ("cargo", 30.0),
                ("sleepy", 0.0),
                ("crunchyutils", 80.0),
            ]),
            5,
            "crunchyutils",
        );
        assert_eq!(top, vec!["cargo", "firefox", "...", "...", "..."]);
    }

    #[test]
    fn top_processes_dedupe_and_truncate() {
        let top = pick_top_processes(
            procs(&[
                ("chrome", 5.0),
                ("chrome", 9.0),
                ("a-really-long-process-name", 7.0),
                ("rustc", 3.0),
                ("node", 2.0),
                ("bash", 1.0),
                ("zsh", 0.5),
            ]),
            5,
            "",
        );
        assert_eq!(top, vec!["chrome", "a-really-long-p...", "rustc", "node", "bash"]);
    }

    #[test]
    fn deepest_mount_wins() {
        let mounts = [Path::new("/"), Path::new("/home"), Path::new("/home/user/data")];
        assert_eq!(mount_for(Path::new("/home/user/code"), &mounts), Some(Path::new("/home")));
        assert_eq!(mount_for(Path::new("/etc"), &mounts), Some(Path::new("/")));
        assert_eq!(mount_for(Path::new("relative"), &mounts), None);
    }
}
