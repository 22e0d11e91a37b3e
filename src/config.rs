use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

pub const VERSION: &str = "PRE 0.17";

// Layout the banner and dashboards are drawn for.
pub const COLS: u16 = 70;
pub const LINES: u16 = 27;

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn base_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("crunchyutils"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("crunchyutils"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_settings_file() -> PathBuf {
    base_dir().join("settings.json")
}

static SETTINGS_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Pin the settings file for this process. Only the first call has effect.
pub fn set_settings_path(path: PathBuf) {
    let _ = SETTINGS_PATH.set(path);
}

pub fn settings_file() -> PathBuf {
    SETTINGS_PATH
        .get()
        .cloned()
        .unwrap_or_else(default_settings_file)
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            T::default()
        }
    }
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// A user-supplied cleanup step appended after the built-in ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraCleanupTask {
    pub desc: String,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sound: bool,
    pub bootup: bool,
    pub skip_delays: bool,
    pub theme: String,
    /// `{city}` is replaced with the URL-encoded city name.
    pub weather_url: String,
    pub http_timeout_secs: u64,
    pub clipboard_poll_ms: u64,
    pub monitor_refresh_ms: u64,
    pub top_processes: usize,
    pub display_managers: Vec<String>,
    pub extra_cleanup: Vec<ExtraCleanupTask>,
}

pub const DEFAULT_WEATHER_URL: &str = "https://wttr.in/{city}?format=%l:+%C+%t+%w";

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            bootup: true,
            skip_delays: false,
            theme: "Amber (Default)".into(),
            weather_url: DEFAULT_WEATHER_URL.into(),
            http_timeout_secs: 15,
            clipboard_poll_ms: 1000,
            monitor_refresh_ms: 1000,
            top_processes: 5,
            display_managers: ["gdm", "lightdm", "sddm", "lxdm", "xdm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extra_cleanup: Vec::new(),
        }
    }
}

pub fn load_settings() -> Settings {
    load_json(&settings_file())
}

pub fn save_settings(d: &Settings) -> Result<()> {
    save_json(&settings_file(), d)
}

// ── Global mutable state ──────────────────────────────────────────────────────

static APP_SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();

fn settings_lock() -> &'static RwLock<Settings> {
    APP_SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

pub fn get_settings() -> Settings {
    settings_lock()
        .read()
        .map(|g| g.clone())
        .unwrap_or_default()
}

pub fn reload_settings() {
    let s = load_settings();
    if let Ok(mut guard) = settings_lock().write() {
        *guard = s;
    }
}

pub fn update_settings<F: FnOnce(&mut Settings)>(f: F) {
    if let Ok(mut guard) = settings_lock().write() {
        f(&mut guard);
    }
}

/// Write the defaults out on first run so users have a file to edit.
pub fn ensure_settings_file() {
    let path = settings_file();
    if path.exists() {
        return;
    }
    if let Err(e) = save_settings(&get_settings()) {
        tracing::warn!(error = %e, "could not create settings file");
    }
}

/// Base delay between startup and cleanup steps.
pub fn step_delay() -> std::time::Duration {
    if get_settings().skip_delays {
        std::time::Duration::ZERO
    } else {
        std::time::Duration::from_secs(1)
    }
}

// ── Themes ────────────────────────────────────────────────────────────────────

use ratatui::style::Color;

pub const THEMES: &[(&str, Color)] = &[
    ("Amber (Default)", Color::Yellow),
    ("Green", Color::Green),
    ("White", Color::White),
    ("Blue", Color::Blue),
    ("Red", Color::Red),
    ("Purple", Color::Magenta),
    ("Light Blue", Color::Cyan),
];

pub fn theme_color(name: &str) -> Color {
    THEMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
        .unwrap_or(Color::Yellow)
}

pub fn current_theme_color() -> Color {
    theme_color(&get_settings().theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s: Settings = load_json(&dir.path().join("nope.json"));
        assert_eq!(s.top_processes, 5);
        assert_eq!(s.weather_url, DEFAULT_WEATHER_URL);
        assert_eq!(s.display_managers.first().map(String::as_str), Some("gdm"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "skip_delays": true, "top_processes": 3 }"#).unwrap();
        let s: Settings = load_json(&path);
        assert!(s.skip_delays);
        assert_eq!(s.top_processes, 3);
        assert!(s.sound);
        assert_eq!(s.clipboard_poll_ms, 1000);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let s: Settings = load_json(&path);
        assert_eq!(s.monitor_refresh_ms, 1000);
    }

    #[test]
    fn save_creates_parent_dirs_and_round_trips_extra_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        s.extra_cleanup.push(ExtraCleanupTask {
            desc: "Cleaning npm cache".into(),
            argv: vec!["npm".into(), "cache".into(), "clean".into(), "--force".into()],
        });
        save_json(&path, &s).unwrap();
        let back: Settings = load_json(&path);
        assert_eq!(back.extra_cleanup, s.extra_cleanup);
    }

    #[test]
    fn unknown_theme_falls_back_to_amber() {
        assert_eq!(theme_color("Neon"), Color::Yellow);
        assert_eq!(theme_color("Green"), Color::Green);
    }
}
