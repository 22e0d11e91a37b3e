use anyhow::Result;
use ratatui::{layout::Rect, Frame};
use std::time::Duration;

use crate::alert;
use crate::clock::parse_hms;
use crate::config::get_settings;
use crate::platform::{
    explorer_kill_command, explorer_start_command, power_command, restart_dm_command,
    session_hangup_commands, Platform, PowerAction,
};
use crate::shell::{run_command, run_quiet};
use crate::ticker::{run_ticker, Flow, Outcome, Tick};
use crate::timers::big_clock;
use crate::ui::{
    confirm, flash_message, input_prompt, pager, run_hotkey_menu, with_spinner, MenuItem,
    MenuResult, Note, Term,
};

const TITLE: &str = "Shutdown/Reboot Timer";

// ── Power timer ───────────────────────────────────────────────────────────────

/// Shows "Time left" from N down to 1 and finishes one tick after 1.
pub struct PowerTimer {
    action: PowerAction,
    total: u64,
    left: Option<u64>,
}

impl PowerTimer {
    pub fn new(action: PowerAction, total: u64) -> Self {
        Self { action, total, left: None }
    }

    pub fn left(&self) -> Option<u64> {
        self.left
    }
}

impl Tick for PowerTimer {
    fn title(&self) -> &str {
        match self.action {
            PowerAction::Shutdown => "Shutdown Timer",
            PowerAction::Reboot => "Reboot Timer",
            PowerAction::Firmware => "Firmware Reboot Timer",
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn tick(&mut self) -> Flow {
        let next = match self.left {
            None => self.total,
            Some(n) => n.saturating_sub(1),
        };
        if next == 0 {
            return Flow::Done;
        }
        self.left = Some(next);
        Flow::Continue
    }

    fn draw(&self, f: &mut Frame, area: Rect) {
        big_clock(f, area, "Time left: ", self.left().unwrap_or(self.total));
    }
}

fn execute_power(platform: &Platform, action: PowerAction) -> Vec<Note> {
    let Some(cmd) = power_command(platform, action) else {
        return vec![Note::error(format!("{} is not supported on {platform}", action.label()))];
    };
    tracing::warn!(action = action.label(), "executing power action");
    match run_command(&cmd) {
        Ok(_) => vec![Note::success(format!("Executed {}", action.label()))],
        Err(e) => {
            let mut notes = vec![Note::error(format!("Failed to {}", action.label())), Note::plain(format!("  Error: {e}"))];
            if let Some(out) = e.output() {
                notes.extend(Note::indented(out));
            }
            notes
        }
    }
}

fn power_timer(terminal: &mut Term, action: PowerAction) -> Result<()> {
    let prompt = "Enter time for shutdown/reboot timer (HH:MM:SS)";
    let Some(input) = input_prompt(terminal, TITLE, prompt)? else {
        return Ok(());
    };
    let Ok(secs) = parse_hms(&input) else {
        return flash_message(terminal, TITLE, "Invalid time format", 1500);
    };

    tracing::info!(action = action.label(), secs, "power timer started");
    let mut timer = PowerTimer::new(action, secs);
    if run_ticker(terminal, &mut timer)? == Outcome::Cancelled {
        return pager(terminal, TITLE, &[Note::info("Cancelled shutdown/reboot timer")]);
    }

    alert::alarm();
    let mut notes = vec![Note::success("Finished timer. Executing...")];
    flash_message(terminal, TITLE, "Finished timer. Executing...", 2000)?;
    notes.extend(execute_power(&Platform::current(), action));
    pager(terminal, TITLE, &notes)
}

pub fn power_menu(terminal: &mut Term) -> Result<()> {
    let items = [
        MenuItem::back("Return"),
        MenuItem::new('1', "Shutdown Timer"),
        MenuItem::new('2', "Reboot Timer"),
    ];
    loop {
        match run_hotkey_menu(terminal, TITLE, &items)? {
            MenuResult::Back => return Ok(()),
            MenuResult::Selected('1') => power_timer(terminal, PowerAction::Shutdown)?,
            MenuResult::Selected('2') => power_timer(terminal, PowerAction::Reboot)?,
            MenuResult::Selected(_) => {}
        }
    }
}

// ── Reboot to firmware ────────────────────────────────────────────────────────

pub fn reboot_bios(terminal: &mut Term) -> Result<()> {
    let title = "Reboot to BIOS";
    if !confirm(terminal, title, "Sure you want to reboot to BIOS?")? {
        return Ok(());
    }
    let mut notes = vec![Note::info("Attempting to reboot into BIOS/UEFI...")];
    let platform = Platform::current();
    let result = with_spinner(terminal, title, &notes, "Rebooting...", move || {
        execute_power(&platform, PowerAction::Firmware)
    })?;
    notes.extend(result);
    pager(terminal, title, &notes)
}

// ── Display manager ───────────────────────────────────────────────────────────

/// Try each display manager in turn, falling back to hanging up the session.
pub fn restart_display_notes(platform: &Platform, managers: &[String]) -> Vec<Note> {
    let mut notes = Vec::new();
    match platform {
        Platform::Windows => {
            notes.push(Note::info("Restarting Windows Explorer..."));
            if let Err(e) = run_command(&explorer_kill_command()) {
                notes.push(Note::error(format!("Failed to kill explorer.exe: {e}")));
                return notes;
            }
            std::thread::sleep(Duration::from_secs(1));
            if let Err(e) = run_command(&explorer_start_command()) {
                notes.push(Note::error(format!("Failed to restart explorer.exe: {e}")));
                return notes;
            }
            notes.push(Note::success("Explorer restarted successfully"));
        }
        Platform::Linux => {
            notes.push(Note::info("Detecting display manager..."));
            for dm in managers {
                if run_command(&restart_dm_command(dm)).is_ok() {
                    tracing::info!(%dm, "display manager restarted");
                    notes.push(Note::success(format!("{dm} restarted successfully")));
                    return notes;
                }
            }
            notes.push(Note::info("Fallback: killing Xorg/Wayland session"));
            for cmd in session_hangup_commands() {
                run_quiet(&cmd);
            }
            notes.push(Note::info("Display restart attempted via fallback (may log out user)"));
        }
        Platform::Unsupported(os) => {
            notes.push(Note::error(format!("Display restart is not supported on {os}")));
        }
    }
    notes
}

pub fn restart_display(terminal: &mut Term) -> Result<()> {
    let title = "Restart Display-Manager";
    if !confirm(terminal, title, "Sure you want to restart your display-manager?")? {
        return Ok(());
    }
    let mut notes = vec![Note::info("Attempting to restart the display manager...")];
    let platform = Platform::current();
    let managers = get_settings().display_managers;
    let result = with_spinner(terminal, title, &notes, "Restarting...", move || {
        restart_display_notes(&platform, &managers)
    })?;
    notes.extend(result);
    pager(terminal, title, &notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_timer_counts_down_to_one_then_fires() {
        let mut t = PowerTimer::new(PowerAction::Shutdown, 3);
        let mut seen = Vec::new();
        while t.tick() == Flow::Continue {
            seen.push(t.left().unwrap());
        }
        assert_eq!(seen, vec![3, 2, 1]);
    }

    #[test]
    fn titles_follow_action() {
        assert_eq!(PowerTimer::new(PowerAction::Reboot, 5).title(), "Reboot Timer");
        assert_eq!(PowerTimer::new(PowerAction::Shutdown, 5).title(), "Shutdown Timer");
    }

    #[test]
    fn unsupported_platform_reports_instead_of_running() {
        let notes = execute_power(&Platform::Unsupported("plan9".into()), PowerAction::Reboot);
        assert_eq!(notes, vec![Note::error("reboot is not supported on plan9")]);

        let notes = restart_display_notes(&Platform::Unsupported("plan9".into()), &[]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tone, crate::ui::Tone::Error);
    }
}
