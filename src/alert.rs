//! Audible and desktop alerts for finished timers and cleanups.
//!
//! There is no audio backend: beeps are terminal bells and notifications go
//! through whatever the desktop provides (`notify-send` or a PowerShell
//! balloon). Missing tools are ignored.

use std::io::Write;
use std::time::Duration;

use crate::config::get_settings;
use crate::platform::Platform;
use crate::shell::{command_exists, run_quiet};

// ── Alert catalogue ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Single short beep after startup.
    Loaded,
    /// Three rising beeps plus a desktop notification.
    Alarm,
}

fn bell_count(alert: Alert) -> usize {
    match alert {
        Alert::Loaded => 1,
        Alert::Alarm => 3,
    }
}

pub fn notify_command(platform: &Platform, title: &str, body: &str) -> Option<Vec<String>> {
    match platform {
        Platform::Linux => Some(vec![
            "notify-send".to_string(),
            title.to_string(),
            body.to_string(),
        ]),
        Platform::Windows => {
            let script = format!(
                "[reflection.assembly]::loadwithpartialname('System.Windows.Forms') | Out-Null; \
                 $n = New-Object System.Windows.Forms.NotifyIcon; \
                 $n.Icon = [System.Drawing.SystemIcons]::Information; \
                 $n.Visible = $true; \
                 $n.ShowBalloonTip(5000, '{}', '{}', 'Info')",
                title.replace('\'', "''"),
                body.replace('\'', "''"),
            );
            Some(vec!["powershell".to_string(), "-Command".to_string(), script])
        }
        Platform::Unsupported(_) => None,
    }
}

// ── Playback ──────────────────────────────────────────────────────────────────

/// Fire an alert on a background thread. No-op if sound is disabled.
pub fn raise(alert: Alert) {
    if !get_settings().sound {
        return;
    }
    std::thread::spawn(move || {
        if alert == Alert::Alarm {
            desktop_notify("CrunchyUtils", "Alert!");
        }
        ring(bell_count(alert));
    });
}

/// Each bell takes the stdout lock that `ui::draw_frame` holds while a frame
/// is written, so it goes out between frames.
fn ring(times: usize) {
    for i in 0..times {
        if i > 0 {
            std::thread::sleep(Duration::from_millis(250));
        }
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

fn desktop_notify(title: &str, body: &str) {
    let platform = Platform::current();
    let Some(cmd) = notify_command(&platform, title, body) else {
        return;
    };
    if !command_exists(&cmd[0]) {
        tracing::debug!(tool = %cmd[0], "notification tool missing");
        return;
    }
    if !run_quiet(&cmd) {
        tracing::debug!("desktop notification failed");
    }
}

// ── Convenience wrappers ──────────────────────────────────────────────────────

pub fn loaded() { raise(Alert::Loaded); }
pub fn alarm()  { raise(Alert::Alarm);  }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_rings_more_than_load_beep() {
        assert!(bell_count(Alert::Alarm) > bell_count(Alert::Loaded));
    }

    #[test]
    fn bells_wait_for_the_frame_being_written() {
        let (tx, rx) = std::sync::mpsc::channel();
        let frame = std::io::stdout().lock();
        std::thread::spawn(move || {
            ring(1);
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        drop(frame);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn notify_commands_per_platform() {
        let linux = notify_command(&Platform::Linux, "T", "B").unwrap();
        assert_eq!(linux, vec!["notify-send", "T", "B"]);

        let win = notify_command(&Platform::Windows, "It's", "done").unwrap();
        assert_eq!(win[0], "powershell");
        assert!(win[2].contains("'It''s'"));

        assert!(notify_command(&Platform::Unsupported("bsd".into()), "T", "B").is_none());
    }
}
