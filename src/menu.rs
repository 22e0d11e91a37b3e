use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;

use crate::boot::{startup, StartupOptions};
use crate::config::VERSION;
use crate::metrics::{format_percent, ram_usage_percent, uptime};
use crate::status::render_status_bar;
use crate::ui::{
    accent_style, draw_frame, error_style, flash_message, normal_style, pad_horizontal, pager, poll_key,
    separator_text, Note, Term,
};
use crate::{cleanup, clipboard, lookup, monitor, power, timers};

const TITLE: &str = "CrunchyUtils";

// ── Logo ──────────────────────────────────────────────────────────────────────

const WIDE_COLS: u16 = 76;

const CRUNCHY: [&str; 6] = [
    "██      ███       ███  ████  ██   ███  ███      ███  ████  ██  ████  █",
    "▓  ▓▓▓▓  ▓▓  ▓▓▓▓  ▓▓  ▓▓▓▓  ▓▓    ▓▓  ▓▓  ▓▓▓▓  ▓▓  ▓▓▓▓  ▓▓▓  ▓▓  ▓▓",
    "▒  ▒▒▒▒▒▒▒▒       ▒▒▒  ▒▒▒▒  ▒▒  ▒  ▒  ▒▒  ▒▒▒▒▒▒▒▒        ▒▒▒▒    ▒▒▒",
    "▓  ▓▓▓▓  ▓▓  ▓▓▓  ▓▓▓  ▓▓▓▓  ▓▓  ▓▓    ██  ▓▓▓▓  ▓▓  ▓▓▓▓  ▓▓▓▓▓  ▓▓▓▓",
    "██      ███  ████  ███      ███  ███   ███      ███  ████  █████  ████",
    " __    __  ________  ________  __         ______   __________________",
];

/// Extra columns when the drawable width allows them.
const CRUNCHY_TAILS: [&str; 6] = ["▓▓▓▒▒▒", "▓▓ ▓▓ ▒", "▒ ▒▒ ▒", "▓▓  ▓ ▒", "▓▓▓ ▒", "__ __ _"];

const UTILS: [&str; 5] = [
    "█  ████  ██        ██        ██  █████████      ██ ",
    "▓  ▓▓▓▓  ▓▓▓▓▓  ▓▓▓▓▓▓▓▓  ▓▓▓▓▓  ▓▓▓▓▓▓▓▓  ▓▓▓▓▓▓▓ ",
    "▒  ▒▒▒▒  ▒▒▒▒▒  ▒▒▒▒▒▒▒▒  ▒▒▒▒▒  ▒▒▒▒▒▒▒▒▒      ▒▒ ",
    "▓  ▓▓▓▓  ▓▓▓▓▓  ▓▓▓▓▓▓▓▓  ▓▓▓▓▓  ▓▓▓▓▓▓▓▓▓▓▓▓▓▓  ▓ ",
    "██      ██████  █████        ██        ███      ██ ",
];

pub fn logo_lines(width: u16) -> Vec<String> {
    let wide = width >= WIDE_COLS;
    CRUNCHY
        .iter()
        .zip(CRUNCHY_TAILS)
        .map(|(line, tail)| if wide { format!("{line}{tail}") } else { line.to_string() })
        .collect()
}

/// Readings shown next to the logo. Taken once per visit to the menu.
#[derive(Debug, Clone)]
pub struct BannerInfo {
    pub uptime: String,
    pub ram: String,
}

impl BannerInfo {
    pub fn read() -> Self {
        Self { uptime: uptime(), ram: format_percent(ram_usage_percent()) }
    }

    pub fn labels(&self, time: &str) -> [String; 5] {
        [
            "By: Knuspii, (M)".to_string(),
            format!("Version  : {VERSION}"),
            format!("Uptime   : {}", self.uptime),
            format!("Used-RAM : {}", self.ram),
            format!("Time: {time}"),
        ]
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Monitor,
    Cleanup,
    Clipboard,
    Timers,
    Power,
    Weather,
    DomainInfo,
    RestartDisplay,
    RebootBios,
    Update,
    Info,
    Restart,
    Quit,
}

const TOOLS: [(char, &str); 9] = [
    ('1', "System monitor"),
    ('2', "Does a system cleanup"),
    ('3', "Clipboard logger"),
    ('4', "Timer and stopwatch"),
    ('5', "Shutdown timer"),
    ('6', "Show weather infos"),
    ('7', "Show infos about domain"),
    ('8', "Restart display-manager"),
    ('9', "Reboot to BIOS"),
];

/// Right-hand column, aligned with tools 6 to 9.
const EXTRAS: [(char, &str); 4] = [('U', "Update"), ('I', "Infos"), ('R', "Restart"), ('Q', "Quit")];

pub fn action_for(code: KeyCode) -> Option<Action> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    Some(match c.to_ascii_lowercase() {
        '1' => Action::Monitor,
        '2' => Action::Cleanup,
        '3' => Action::Clipboard,
        '4' => Action::Timers,
        '5' => Action::Power,
        '6' => Action::Weather,
        '7' => Action::DomainInfo,
        '8' => Action::RestartDisplay,
        '9' => Action::RebootBios,
        'u' => Action::Update,
        'i' => Action::Info,
        'r' => Action::Restart,
        'q' | '0' => Action::Quit,
        _ => return None,
    })
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn tool_line(index: usize) -> Line<'static> {
    let (key, label) = TOOLS[index];
    let mut spans = vec![Span::raw(format!("  [{key}]  - "))];
    match index.checked_sub(TOOLS.len() - EXTRAS.len()).map(|i| EXTRAS[i]) {
        Some((extra_key, extra_label)) => {
            spans.push(Span::styled(format!("{label:<42}"), accent_style()));
            spans.push(Span::raw(format!("[{extra_key}]  - ")));
            let style = if extra_key == 'Q' { error_style() } else { accent_style() };
            spans.push(Span::styled(extra_label, style));
        }
        None => spans.push(Span::styled(label, accent_style())),
    }
    Line::from(spans)
}

fn draw_banner(f: &mut Frame, info: &BannerInfo) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());
    let body = pad_horizontal(chunks[0]);
    let separator = Line::from(Span::styled(separator_text(body.width), accent_style()));
    let time = Local::now().format("%H:%M:%S").to_string();

    let mut lines = vec![separator.clone()];
    lines.extend(
        logo_lines(body.width)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, accent_style()))),
    );
    for (art, label) in UTILS.iter().zip(info.labels(&time)) {
        lines.push(Line::from(vec![
            Span::styled(*art, accent_style()),
            Span::styled(label, normal_style()),
        ]));
    }
    lines.push(separator.clone());
    lines.push(Line::from("Tools:"));
    lines.extend((0..TOOLS.len()).map(tool_line));
    lines.push(separator);
    lines.push(Line::from("Press key to launch a tool (1-9)"));

    f.render_widget(Paragraph::new(lines), body);
    render_status_bar(f, chunks[1]);
}

// ── Main loop ─────────────────────────────────────────────────────────────────

fn wait_for_action(terminal: &mut Term) -> Result<Action> {
    let info = BannerInfo::read();
    loop {
        draw_frame(terminal, |f| draw_banner(f, &info))?;
        if let Some(key) = poll_key(Duration::from_millis(250))? {
            match action_for(key.code) {
                Some(action) => return Ok(action),
                None => flash_message(terminal, TITLE, "Invalid key", 2000)?,
            }
        }
    }
}

pub fn main_menu(terminal: &mut Term, opts: StartupOptions) -> Result<()> {
    loop {
        let action = wait_for_action(terminal)?;
        tracing::debug!(?action, "menu action");
        match action {
            Action::Monitor => monitor::system_monitor(terminal)?,
            Action::Cleanup => cleanup::clean_system(terminal)?,
            Action::Clipboard => clipboard::clipboard_logger(terminal)?,
            Action::Timers => timers::timer_menu(terminal)?,
            Action::Power => power::power_menu(terminal)?,
            Action::Weather => lookup::weather(terminal)?,
            Action::DomainInfo => lookup::domain_info(terminal)?,
            Action::RestartDisplay => power::restart_display(terminal)?,
            Action::RebootBios => power::reboot_bios(terminal)?,
            Action::Update => {
                pager(terminal, "Update CrunchyUtils", &[Note::info("CURRENTLY UNAVAILABLE")])?
            }
            Action::Info => pager(terminal, "Infos", &[Note::info(format!("CrunchyUtils {VERSION}"))])?,
            Action::Restart => startup(terminal, opts)?,
            Action::Quit => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(action_for(KeyCode::Char('1')), Some(Action::Monitor));
        assert_eq!(action_for(KeyCode::Char('9')), Some(Action::RebootBios));
        assert_eq!(action_for(KeyCode::Char('U')), Some(Action::Update));
        assert_eq!(action_for(KeyCode::Char('i')), Some(Action::Info));
        assert_eq!(action_for(KeyCode::Char('R')), Some(Action::Restart));
        assert_eq!(action_for(KeyCode::Char('0')), Some(Action::Quit));
        assert_eq!(action_for(KeyCode::Char('Q')), Some(Action::Quit));
        assert_eq!(action_for(KeyCode::Char('x')), None);
        assert_eq!(action_for(KeyCode::Enter), None);
    }

    #[test]
    fn wide_terminals_get_the_long_logo() {
        let narrow = logo_lines(70);
        let wide = logo_lines(80);
        assert_eq!(narrow.len(), wide.len());
        assert_eq!(narrow[0], CRUNCHY[0]);
        assert!(wide[0].starts_with(CRUNCHY[0]));
        assert!(wide[0].chars().count() > narrow[0].chars().count());
    }

    #[test]
    fn banner_lists_version_and_readings() {
        let info = BannerInfo { uptime: "3H:07M".into(), ram: "41%".into() };
        let labels = info.labels("12:00:00");
        assert_eq!(labels[1], format!("Version  : {VERSION}"));
        assert_eq!(labels[2], "Uptime   : 3H:07M");
        assert_eq!(labels[3], "Used-RAM : 41%");
        assert_eq!(labels[4], "Time: 12:00:00");
    }

    #[test]
    fn extras_share_rows_with_the_last_tools() {
        let text = |l: Line| l.spans.iter().map(|s| s.content.to_string()).collect::<String>();
        assert!(!text(tool_line(0)).contains("[U]"));
        assert!(text(tool_line(5)).contains("[U]  - Update"));
        assert!(text(tool_line(8)).ends_with("[Q]  - Quit"));
    }
}
