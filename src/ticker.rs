//! Fixed-rate refresh loop shared by the monitor, timers and clipboard logger.
//!
//! A task is ticked on a fixed schedule and redrawn after every tick. Between
//! ticks the loop waits on the keyboard; Enter, Esc or `q` cancels.

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{layout::Rect, Frame};
use std::time::{Duration, Instant};

use crate::ui::{draw_frame, is_cancel_key, render_hint, screen_layout, Term};

/// Longest single wait on the keyboard, so resizes redraw promptly.
const POLL_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Cancelled,
}

pub trait Tick {
    fn title(&self) -> &str;
    fn interval(&self) -> Duration;
    /// Advance one step. The first call happens as soon as the loop starts.
    fn tick(&mut self) -> Flow;
    fn draw(&self, f: &mut Frame, area: Rect);
    fn hint(&self) -> &str {
        "Press [Enter] to cancel"
    }
}

/// Tracks when the next tick is due. A late tick pushes the schedule back
/// instead of firing a burst to catch up.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    next: Instant,
    interval: Duration,
}

impl Schedule {
    pub fn starting_at(now: Instant, interval: Duration) -> Self {
        Self { next: now, interval }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    pub fn advance(&mut self, now: Instant) {
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
    }

    pub fn wait(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }
}

fn draw<T: Tick>(terminal: &mut Term, task: &T) -> Result<()> {
    draw_frame(terminal, |f| {
        let screen = screen_layout(f, task.title());
        task.draw(f, screen.body);
        render_hint(f, screen.hint, task.hint());
    })?;
    Ok(())
}

pub fn run_ticker<T: Tick>(terminal: &mut Term, task: &mut T) -> Result<Outcome> {
    let mut schedule = Schedule::starting_at(Instant::now(), task.interval());
    tracing::debug!(task = task.title(), "ticker started");

    loop {
        let now = Instant::now();
        if schedule.is_due(now) {
            let flow = task.tick();
            schedule.advance(now);
            draw(terminal, task)?;
            if flow == Flow::Done {
                tracing::debug!(task = task.title(), "ticker finished");
                return Ok(Outcome::Finished);
            }
        }

        let wait = schedule.wait(Instant::now()).min(POLL_SLICE);
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press && is_cancel_key(key.code) => {
                    tracing::debug!(task = task.title(), "ticker cancelled");
                    return Ok(Outcome::Cancelled);
                }
                Event::Resize(..) => draw(terminal, task)?,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_immediate() {
        let t0 = Instant::now();
        let s = Schedule::starting_at(t0, Duration::from_secs(1));
        assert!(s.is_due(t0));
    }

    #[test]
    fn ticks_follow_fixed_rate() {
        let t0 = Instant::now();
        let mut s = Schedule::starting_at(t0, Duration::from_secs(1));
        s.advance(t0 + Duration::from_millis(20));
        assert!(!s.is_due(t0 + Duration::from_millis(999)));
        assert!(s.is_due(t0 + Duration::from_secs(1)));
        assert_eq!(s.wait(t0 + Duration::from_millis(400)), Duration::from_millis(600));
    }

    #[test]
    fn late_ticks_do_not_burst() {
        let t0 = Instant::now();
        let mut s = Schedule::starting_at(t0, Duration::from_secs(1));
        let late = t0 + Duration::from_secs(5);
        s.advance(late);
        assert!(!s.is_due(late));
        assert_eq!(s.wait(late), Duration::from_secs(1));
    }
}
