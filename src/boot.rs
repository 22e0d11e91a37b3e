use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{self, SetSize, SetTitle},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;

use crate::alert;
use crate::config::{get_settings, step_delay, COLS, LINES, VERSION};
use crate::platform::Platform;
use crate::ui::{dim_style, draw_frame, pad_horizontal, poll_key, Note, Term, Tone};

const CHAR_DELAY: Duration = Duration::from_millis(8);
const MISMATCH_PAUSE: Duration = Duration::from_secs(2);

/// What the startup sequence should do besides the splash.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartupOptions {
    pub no_init: bool,
}

// ── Splash text ───────────────────────────────────────────────────────────────

pub fn splash_notes(platform: &Platform, now: DateTime<Local>) -> Vec<Note> {
    let mut notes = vec![
        Note::info("CrunchyUtils starting..."),
        Note::info(format!("CrunchyUtils {VERSION}")),
        Note::plain(" *******************"),
        Note::plain(" *  CrunchyUtils   *"),
        Note::plain(" *  c2025 Knuspii  *"),
        Note::plain(" *******************"),
        Note::plain(""),
    ];
    notes.push(match platform {
        Platform::Unsupported(os) => Note::error(format!("OS: {os} not supported!")),
        known => Note::accent(format!("{known} Detected")),
    });
    notes.push(Note::plain(format!(
        "Time: {} //// Date: {}",
        now.format("%H:%M:%S"),
        now.format("%d.%m.%Y")
    )));
    notes.push(Note::plain(""));
    notes
}

fn pick_username(user: Option<String>, username: Option<String>) -> Option<String> {
    let usable = |name: &String| !name.trim().is_empty();
    user.filter(usable).or(username.filter(usable))
}

pub fn username_note() -> Note {
    let name = pick_username(std::env::var("USER").ok(), std::env::var("USERNAME").ok());
    match name {
        Some(name) => Note::info(format!("Username: {name}")),
        None => Note::error("Username: unknown"),
    }
}

/// Compare the size the terminal reports with the one the layout needs.
pub fn size_note(got: Option<(u16, u16)>) -> Note {
    match got {
        Some((cols, lines)) if cols > 0 && lines > 0 => {
            if (cols, lines) == (COLS, LINES) {
                Note::info(format!("Terminal size OK: {cols}x{lines}"))
            } else {
                Note::error(format!(
                    "Terminal size mismatch got: {cols}x{lines} expected: {COLS}x{LINES}"
                ))
            }
        }
        _ => Note::error("Could not detect terminal size"),
    }
}

// ── Typed output ──────────────────────────────────────────────────────────────

/// Draws notes one character at a time until a key is pressed, after which
/// the rest of the sequence appears at once.
struct Typist {
    shown: Vec<Note>,
    animate: bool,
    skipped: bool,
}

impl Typist {
    fn new(animate: bool) -> Self {
        Self { shown: Vec::new(), animate, skipped: false }
    }

    fn check_skip(&mut self) -> Result<bool> {
        if !self.skipped {
            if let Some(key) = poll_key(Duration::ZERO)? {
                if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Esc) {
                    tracing::debug!("startup animation skipped");
                    self.skipped = true;
                }
            }
        }
        Ok(self.skipped)
    }

    fn type_note(&mut self, terminal: &mut Term, note: Note) -> Result<()> {
        if self.animate && !self.check_skip()? {
            let chars: Vec<char> = note.text.chars().collect();
            for n in 1..=chars.len() {
                let partial = Note { tone: note.tone, text: chars[..n].iter().collect() };
                draw_frame(terminal, |f| draw_splash(f, &self.shown, Some(&partial)))?;
                if self.check_skip()? {
                    break;
                }
                std::thread::sleep(CHAR_DELAY);
            }
        }
        self.shown.push(note);
        draw_frame(terminal, |f| draw_splash(f, &self.shown, None))?;
        Ok(())
    }

    fn type_all(&mut self, terminal: &mut Term, notes: Vec<Note>) -> Result<()> {
        for note in notes {
            self.type_note(terminal, note)?;
        }
        Ok(())
    }

    /// Sleep in short slices so a skip key still cuts the wait.
    fn pause(&mut self, total: Duration) -> Result<()> {
        let slice = Duration::from_millis(50);
        let mut waited = Duration::ZERO;
        while waited < total {
            if self.check_skip()? {
                break;
            }
            let step = slice.min(total - waited);
            std::thread::sleep(step);
            waited += step;
        }
        Ok(())
    }
}

fn draw_splash(f: &mut Frame, shown: &[Note], typing: Option<&Note>) {
    let size = f.area();
    let body = pad_horizontal(Rect { height: size.height.saturating_sub(1), ..size });
    let room = body.height as usize;
    let total = shown.len() + usize::from(typing.is_some());
    let skip = total.saturating_sub(room);
    let mut lines: Vec<Line> = shown.iter().skip(skip).map(Note::to_line).collect();
    if let Some(note) = typing {
        lines.push(note.to_line());
    }
    f.render_widget(Paragraph::new(lines), body);

    let hint = Paragraph::new(Span::styled("SPACE to skip", dim_style()));
    let hint_area = Rect { x: body.x, y: size.height.saturating_sub(1), width: body.width, height: 1 };
    f.render_widget(hint, hint_area);
}

// ── Terminal setup ────────────────────────────────────────────────────────────

/// Title the window, ask for the layout size, then report what we got.
fn init_app(terminal: &mut Term) -> Vec<Note> {
    let mut notes = vec![Note::info("Initializing..."), username_note()];

    if let Err(e) = execute!(terminal.backend_mut(), SetTitle("CrunchyUtils"), SetSize(COLS, LINES)) {
        tracing::warn!(error = %e, "terminal resize request failed");
    }
    std::thread::sleep(Duration::from_millis(100));
    if let Err(e) = terminal.autoresize() {
        tracing::debug!(error = %e, "autoresize failed");
    }

    let got = terminal::size().ok();
    tracing::info!(?got, expected = ?(COLS, LINES), "terminal size");
    notes.push(size_note(got));
    notes
}

// ── Startup sequence ──────────────────────────────────────────────────────────

pub fn startup(terminal: &mut Term, opts: StartupOptions) -> Result<()> {
    let settings = get_settings();
    let delay = step_delay();
    let mut typist = Typist::new(settings.bootup && !settings.skip_delays);
    terminal.clear()?;

    typist.type_all(terminal, splash_notes(&Platform::current(), Local::now()))?;
    typist.pause(delay * 2)?;

    if !opts.no_init {
        let notes = init_app(terminal);
        let mismatch = notes.iter().any(|n| n.tone == Tone::Error);
        typist.type_all(terminal, notes)?;
        if mismatch {
            typist.pause(MISMATCH_PAUSE)?;
        }
    }

    typist.type_all(
        terminal,
        vec![Note::plain("**************************"), Note::success("LOADING SUCCESSFUL!")],
    )?;
    typist.pause(delay * 2)?;

    tracing::info!(version = VERSION, "startup finished");
    alert::loaded();
    terminal.clear()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn splash_names_the_platform_and_time() {
        let now = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let notes = splash_notes(&Platform::Linux, now);
        assert_eq!(notes[1], Note::info(format!("CrunchyUtils {VERSION}")));
        assert!(notes.contains(&Note::accent("Linux Detected")));
        assert!(notes.contains(&Note::plain("Time: 05:06:07 //// Date: 04.03.2025")));

        let notes = splash_notes(&Platform::Unsupported("freebsd".into()), now);
        assert!(notes.contains(&Note::error("OS: freebsd not supported!")));
    }

    #[test]
    fn size_check_reports_mismatch() {
        assert_eq!(size_note(Some((70, 27))), Note::info("Terminal size OK: 70x27"));
        assert_eq!(
            size_note(Some((80, 24))),
            Note::error("Terminal size mismatch got: 80x24 expected: 70x27")
        );
        assert_eq!(size_note(None), Note::error("Could not detect terminal size"));
        assert_eq!(size_note(Some((0, 0))), Note::error("Could not detect terminal size"));
    }

    #[test]
    fn username_falls_back_to_windows_variable() {
        assert_eq!(pick_username(Some("tux".into()), Some("other".into())), Some("tux".into()));
        assert_eq!(pick_username(None, Some("Admin".into())), Some("Admin".into()));
        assert_eq!(pick_username(Some(" ".into()), Some("Admin".into())), Some("Admin".into()));
        assert_eq!(pick_username(Some(" ".into()), None), None);
        assert_eq!(pick_username(None, None), None);
    }
}
