use anyhow::Result;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::{Duration, Instant};

use crate::alert;
use crate::clock::{format_hms, parse_hms};
use crate::ticker::{run_ticker, Flow, Outcome, Tick};
use crate::ui::{
    flash_message, input_prompt, pager, run_hotkey_menu, success_style, MenuItem, MenuResult,
    Note, Term,
};

const TITLE: &str = "Timer/Stopwatch";

pub fn big_clock(f: &mut Frame, area: Rect, label: &str, secs: u64) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("{label}{}", format_hms(secs)), success_style())),
    ];
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// Shows N, N-1, ... 0 on consecutive ticks, then finishes.
pub struct Countdown {
    total: u64,
    shown: Option<u64>,
}

impl Countdown {
    pub fn new(total: u64) -> Self {
        Self { total, shown: None }
    }

    pub fn shown(&self) -> Option<u64> {
        self.shown
    }
}

impl Tick for Countdown {
    fn title(&self) -> &str {
        "Timer"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn tick(&mut self) -> Flow {
        let next = match self.shown {
            None => self.total,
            Some(0) => return Flow::Done,
            Some(n) => n - 1,
        };
        self.shown = Some(next);
        if next == 0 { Flow::Done } else { Flow::Continue }
    }

    fn draw(&self, f: &mut Frame, area: Rect) {
        big_clock(f, area, "", self.shown().unwrap_or(self.total));
    }
}

// ── Stopwatch ─────────────────────────────────────────────────────────────────

pub struct Stopwatch {
    started: Instant,
    elapsed: u64,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self { started: Instant::now(), elapsed: 0 }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed
    }

    fn update(&mut self, now: Instant) {
        self.elapsed = now.saturating_duration_since(self.started).as_secs();
    }
}

impl Tick for Stopwatch {
    fn title(&self) -> &str {
        "Stopwatch"
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn tick(&mut self) -> Flow {
        self.update(Instant::now());
        Flow::Continue
    }

    fn draw(&self, f: &mut Frame, area: Rect) {
        big_clock(f, area, "", self.elapsed);
    }

    fn hint(&self) -> &str {
        "Press [Enter] to stop"
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

fn countdown(terminal: &mut Term) -> Result<()> {
    let Some(input) = input_prompt(terminal, TITLE, "Enter time (HH:MM:SS)")? else {
        return Ok(());
    };
    let secs = match parse_hms(&input) {
        Ok(secs) => secs,
        Err(e) => {
            tracing::debug!(%input, error = %e, "rejected timer input");
            return flash_message(terminal, TITLE, "Invalid time format", 1500);
        }
    };

    tracing::info!(secs, "timer started");
    let mut timer = Countdown::new(secs);
    let notes = match run_ticker(terminal, &mut timer)? {
        Outcome::Finished => {
            alert::alarm();
            vec![Note::success("Timer finished")]
        }
        Outcome::Cancelled => vec![Note::info("Cancelled timer")],
    };
    pager(terminal, TITLE, &notes)
}

fn stopwatch(terminal: &mut Term) -> Result<()> {
    let mut watch = Stopwatch::start();
    run_ticker(terminal, &mut watch)?;
    let notes = vec![
        Note::info("Stopwatch stopped"),
        Note::plain(format!("Elapsed: {}", format_hms(watch.elapsed_secs()))),
    ];
    pager(terminal, TITLE, &notes)
}

pub fn timer_menu(terminal: &mut Term) -> Result<()> {
    let items = [
        MenuItem::back("Return"),
        MenuItem::new('1', "Timer"),
        MenuItem::new('2', "Stopwatch"),
    ];
    loop {
        match run_hotkey_menu(terminal, TITLE, &items)? {
            MenuResult::Back => return Ok(()),
            MenuResult::Selected('1') => countdown(terminal)?,
            MenuResult::Selected('2') => stopwatch(terminal)?,
            MenuResult::Selected(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_shows_every_second_down_to_zero() {
        let mut c = Countdown::new(3);
        let mut seen = Vec::new();
        loop {
            let flow = c.tick();
            seen.push(c.shown().unwrap());
            if flow == Flow::Done {
                break;
            }
        }
        assert_eq!(seen, vec![3, 2, 1, 0]);
    }

    #[test]
    fn finished_countdown_stays_done() {
        let mut c = Countdown::new(1);
        assert_eq!(c.tick(), Flow::Continue);
        assert_eq!(c.tick(), Flow::Done);
        assert_eq!(c.tick(), Flow::Done);
        assert_eq!(c.shown(), Some(0));
    }

    #[test]
    fn stopwatch_counts_whole_seconds() {
        let mut w = Stopwatch::start();
        let t0 = w.started;
        w.update(t0 + Duration::from_millis(2900));
        assert_eq!(w.elapsed_secs(), 2);
        w.update(t0 + Duration::from_secs(61));
        assert_eq!(w.elapsed_secs(), 61);
    }
}
