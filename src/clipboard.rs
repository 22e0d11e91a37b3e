use anyhow::Result;
use chrono::Local;
use ratatui::{layout::Rect, text::Line, widgets::Paragraph, Frame};
use std::time::Duration;
use thiserror::Error;

use crate::config::get_settings;
use crate::platform::{clipboard_readers, Platform};
use crate::shell::{capture_stdout, command_exists};
use crate::ticker::{run_ticker, Flow, Tick};
use crate::ui::{pager, Note, Term};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard tool found (xclip/xsel/wl-paste)")]
    NoTool,
    #[error("{0}")]
    Read(#[from] crate::shell::ShellError),
}

pub trait ClipboardReader {
    fn read(&mut self) -> Result<String, ClipboardError>;
}

/// Reads through the first working command-line clipboard tool.
///
/// With a chain of tools (xclip, xsel, wl-paste) a tool that runs but fails
/// means an empty selection, so the next one is tried and an all-failed round
/// reads as empty. A lone reader (PowerShell `Get-Clipboard`) has nothing to
/// fall back to and its failure is returned.
pub struct CommandReader {
    candidates: Vec<Vec<String>>,
}

impl CommandReader {
    pub fn new(candidates: Vec<Vec<String>>) -> Self {
        Self { candidates }
    }

    pub fn for_platform(platform: &Platform) -> Self {
        Self::new(clipboard_readers(platform))
    }

    fn is_chain(&self) -> bool {
        self.candidates.len() > 1
    }
}

impl ClipboardReader for CommandReader {
    fn read(&mut self) -> Result<String, ClipboardError> {
        let mut found = false;
        let mut last_err = None;
        for cmd in &self.candidates {
            let Some(bin) = cmd.first() else {
                continue;
            };
            if !command_exists(bin) {
                continue;
            }
            found = true;
            match capture_stdout(cmd) {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            None if !found => Err(ClipboardError::NoTool),
            None => Ok(String::new()),
            Some(e) if !self.is_chain() => Err(ClipboardError::Read(e)),
            Some(e) => {
                tracing::debug!(error = %e, "clipboard tools returned nothing");
                Ok(String::new())
            }
        }
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

pub fn copied_line(timestamp: &str, text: &str) -> String {
    format!("{timestamp} Copied: \"{text}\"")
}

pub struct ClipboardLogger<R> {
    reader: R,
    poll: Duration,
    previous: String,
    notes: Vec<Note>,
    failed: bool,
}

impl<R: ClipboardReader> ClipboardLogger<R> {
    pub fn new(reader: R, poll: Duration) -> Self {
        Self {
            reader,
            poll,
            previous: String::new(),
            notes: vec![Note::info("Clipboard logger started. Press [Enter] to cancel")],
            failed: false,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Record `clip` if it is new. Returns whether a line was added.
    pub fn observe(&mut self, clip: &str, timestamp: &str) -> bool {
        if clip.is_empty() || clip == self.previous {
            return false;
        }
        self.previous = clip.to_string();
        self.notes.push(Note::accent(copied_line(timestamp, clip)));
        true
    }
}

impl<R: ClipboardReader> Tick for ClipboardLogger<R> {
    fn title(&self) -> &str {
        "Clipboard Logger"
    }

    fn interval(&self) -> Duration {
        self.poll
    }

    fn tick(&mut self) -> Flow {
        match self.reader.read() {
            Ok(clip) => {
                let ts = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                if self.observe(&clip, &ts) {
                    tracing::debug!(chars = clip.chars().count(), "clipboard changed");
                }
                Flow::Continue
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard read failed");
                self.notes.push(Note::error(format!("Clipboard read failed: {e}")));
                self.failed = true;
                Flow::Done
            }
        }
    }

    fn draw(&self, f: &mut Frame, area: Rect) {
        let room = area.height as usize;
        let skip = self.notes().len().saturating_sub(room);
        let lines: Vec<Line> = self.notes().iter().skip(skip).map(Note::to_line).collect();
        f.render_widget(Paragraph::new(lines), area);
    }
}

pub fn clipboard_logger(terminal: &mut Term) -> Result<()> {
    let poll = Duration::from_millis(get_settings().clipboard_poll_ms.max(100));
    let reader = CommandReader::for_platform(&Platform::current());
    let mut logger = ClipboardLogger::new(reader, poll);
    run_ticker(terminal, &mut logger)?;
    let failed = logger.failed();
    let mut notes = logger.into_notes();
    if !failed {
        notes.push(Note::info("Cancelled clipboard logger"));
    }
    pager(terminal, "Clipboard Logger", &notes)
}
