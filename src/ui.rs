use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::config::current_theme_color;
use crate::status::render_status_bar;

pub type Term = Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

/// Draw one frame with stdout locked. Alert bells rung from other threads
/// wait for the lock, so they never land inside an escape sequence.
pub fn draw_frame<F: FnOnce(&mut Frame)>(terminal: &mut Term, render: F) -> Result<()> {
    let _out = std::io::stdout().lock();
    terminal.draw(render)?;
    Ok(())
}

pub const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

// ── Padding ───────────────────────────────────────────────────────────────────
const H_PAD: u16 = 1;

/// Shrink a rect by H_PAD columns on each side.
pub fn pad_horizontal(area: Rect) -> Rect {
    let pad = H_PAD.min(area.width / 2);
    Rect {
        x: area.x + pad,
        y: area.y,
        width: area.width.saturating_sub(pad * 2),
        height: area.height,
    }
}

// ── Color helpers ─────────────────────────────────────────────────────────────

pub fn normal_style()  -> Style { Style::default() }
pub fn accent_style()  -> Style { Style::default().fg(current_theme_color()) }
pub fn sel_style()     -> Style { Style::default().fg(Color::Black).bg(current_theme_color()).add_modifier(Modifier::BOLD) }
pub fn title_style()   -> Style { Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD) }
pub fn dim_style()     -> Style { Style::default().fg(current_theme_color()).add_modifier(Modifier::DIM) }
pub fn error_style()   -> Style { Style::default().fg(Color::Red) }
pub fn success_style() -> Style { Style::default().fg(Color::Green) }

// ── Notes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Accent,
    Info,
    Error,
    Success,
}

/// One line of tool output with its severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub tone: Tone,
    pub text: String,
}

impl Note {
    pub fn plain(text: impl Into<String>)   -> Self { Self { tone: Tone::Plain,   text: text.into() } }
    pub fn accent(text: impl Into<String>)  -> Self { Self { tone: Tone::Accent,  text: text.into() } }
    pub fn info(text: impl Into<String>)    -> Self { Self { tone: Tone::Info,    text: text.into() } }
    pub fn error(text: impl Into<String>)   -> Self { Self { tone: Tone::Error,   text: text.into() } }
    pub fn success(text: impl Into<String>) -> Self { Self { tone: Tone::Success, text: text.into() } }

    /// Split multi-line output into indented plain notes.
    pub fn indented(block: &str) -> Vec<Note> {
        block.lines().map(|l| Note::plain(format!("  {l}"))).collect()
    }

    pub fn to_line(&self) -> Line<'_> {
        match self.tone {
            Tone::Plain => Line::from(Span::styled(self.text.as_str(), normal_style())),
            Tone::Accent => Line::from(Span::styled(self.text.as_str(), accent_style())),
            Tone::Info => Line::from(vec![
                Span::styled("[INFO] ", accent_style()),
                Span::styled(self.text.as_str(), normal_style()),
            ]),
            Tone::Error => Line::from(vec![
                Span::styled("[ERROR] ", error_style()),
                Span::styled(self.text.as_str(), normal_style()),
            ]),
            Tone::Success => Line::from(vec![
                Span::styled("[INFO] ", success_style()),
                Span::styled(self.text.as_str(), normal_style()),
            ]),
        }
    }
}

// ── Title & separators ────────────────────────────────────────────────────────

pub fn command_title(name: &str) -> String {
    format!("#   {name}   #")
}

pub fn render_title(f: &mut Frame, area: Rect, name: &str) {
    let p = Paragraph::new(command_title(name))
        .alignment(Alignment::Center)
        .style(title_style());
    f.render_widget(p, area);
}

pub fn separator_text(width: u16) -> String {
    if width < 2 {
        return "#".repeat(width as usize);
    }
    format!("#{}#", "═".repeat(width as usize - 2))
}

pub fn render_separator(f: &mut Frame, area: Rect) {
    let p = Paragraph::new(separator_text(area.width)).style(accent_style());
    f.render_widget(p, area);
}

/// Standard frame: title, separator, body, hint, status bar.
pub struct Screen {
    pub body: Rect,
    pub hint: Rect,
}

pub fn screen_layout(f: &mut Frame, title: &str) -> Screen {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());
    render_title(f, chunks[0], title);
    render_separator(f, chunks[1]);
    render_status_bar(f, chunks[4]);
    Screen {
        body: pad_horizontal(chunks[2]),
        hint: pad_horizontal(chunks[3]),
    }
}

pub fn render_hint(f: &mut Frame, area: Rect, hint: &str) {
    f.render_widget(Paragraph::new(hint).style(dim_style()), area);
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Wait up to `timeout` for a key press. Releases and repeats are dropped.
pub fn poll_key(timeout: Duration) -> Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}

/// Keys that stop a running loop.
pub fn is_cancel_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q'))
}

// ── Hotkey menu ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuResult {
    Selected(char),
    Back,
}

#[derive(Debug, Clone, Copy)]
pub struct MenuItem<'a> {
    pub key: char,
    pub label: &'a str,
    pub tone: Tone,
}

impl<'a> MenuItem<'a> {
    pub const fn new(key: char, label: &'a str) -> Self {
        Self { key, label, tone: Tone::Accent }
    }

    pub const fn back(label: &'a str) -> Self {
        Self { key: '0', label, tone: Tone::Error }
    }
}

pub fn menu_item_line<'a>(item: &MenuItem<'a>) -> Line<'a> {
    let style = match item.tone {
        Tone::Error => error_style(),
        _ => accent_style(),
    };
    Line::from(vec![
        Span::raw(format!(" [{}] - ", item.key.to_ascii_uppercase())),
        Span::styled(item.label, style),
    ])
}

/// Map a key to the menu entry it selects. `0` and Esc always mean back.
pub fn match_hotkey(items: &[MenuItem], code: KeyCode) -> Option<MenuResult> {
    match code {
        KeyCode::Esc | KeyCode::Char('0') => Some(MenuResult::Back),
        KeyCode::Char(c) => items
            .iter()
            .find(|item| item.key.eq_ignore_ascii_case(&c))
            .map(|item| MenuResult::Selected(item.key)),
        _ => None,
    }
}

pub fn run_hotkey_menu(terminal: &mut Term, title: &str, items: &[MenuItem]) -> Result<MenuResult> {
    let highest = items.iter().map(|i| i.key).filter(char::is_ascii_digit).max().unwrap_or('0');
    let hint = format!("Press key (0-{highest})");
    loop {
        draw_frame(terminal, |f| {
            let screen = screen_layout(f, title);
            let lines: Vec<Line> = items.iter().map(menu_item_line).collect();
            f.render_widget(Paragraph::new(lines), screen.body);
            render_hint(f, screen.hint, &hint);
        })?;

        if let Some(key) = poll_key(Duration::from_millis(250))? {
            match match_hotkey(items, key.code) {
                Some(result) => return Ok(result),
                None => flash_message(terminal, title, "Invalid Option", 1200)?,
            }
        }
    }
}

// ── Text input ────────────────────────────────────────────────────────────────

pub fn input_prompt(terminal: &mut Term, title: &str, prompt: &str) -> Result<Option<String>> {
    let mut buf = String::new();

    loop {
        draw_frame(terminal, |f| {
            let screen = screen_layout(f, title);
            let lines = vec![
                Line::from(Span::styled(prompt, normal_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled(" >>: ", accent_style()),
                    Span::raw(format!("{buf}█")),
                ]),
            ];
            f.render_widget(Paragraph::new(lines), screen.body);
            render_hint(f, screen.hint, "Enter = confirm   Esc = cancel");
        })?;

        if let Some(key) = poll_key(Duration::from_millis(50))? {
            match key.code {
                KeyCode::Enter => return Ok(Some(buf.trim().to_string())),
                KeyCode::Esc => return Ok(None),
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char(c) if (c as u32) >= 32 => buf.push(c),
                _ => {}
            }
        }
    }
}

// ── Confirmation ──────────────────────────────────────────────────────────────

/// Interpret a typed answer. `None` means ask again.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "ye" | "yup" | "ja" | "yessir" | "yep" => Some(true),
        "n" | "no" | "nah" | "ne" | "nein" | "na" | "nope" => Some(false),
        _ => None,
    }
}

pub fn confirm(terminal: &mut Term, title: &str, question: &str) -> Result<bool> {
    let prompt = format!("{question} (yes/no)");
    loop {
        match input_prompt(terminal, title, &prompt)? {
            None => return Ok(false),
            Some(answer) => {
                if let Some(yes) = parse_answer(&answer) {
                    return Ok(yes);
                }
            }
        }
    }
}

// ── Message flash ─────────────────────────────────────────────────────────────

pub fn flash_message(terminal: &mut Term, title: &str, message: &str, ms: u64) -> Result<()> {
    draw_frame(terminal, |f| {
        let screen = screen_layout(f, title);
        let p = Paragraph::new(format!("\n{message}")).style(normal_style());
        f.render_widget(p, screen.body);
    })?;
    std::thread::sleep(Duration::from_millis(ms));
    Ok(())
}

// ── Pager ─────────────────────────────────────────────────────────────────────

/// Scrollable view of finished output; also serves as "press Enter to continue".
pub fn pager(terminal: &mut Term, title: &str, notes: &[Note]) -> Result<()> {
    let mut offset = 0usize;

    loop {
        draw_frame(terminal, |f| {
            let screen = screen_layout(f, title);
            let visible_h = screen.body.height as usize;
            let page: Vec<Line> = notes
                .iter()
                .skip(offset)
                .take(visible_h)
                .map(Note::to_line)
                .collect();
            f.render_widget(Paragraph::new(page), screen.body);
            render_hint(f, screen.hint, "↑↓ scroll   Enter = continue");
        })?;

        if let Some(key) = poll_key(Duration::from_millis(100))? {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => offset = offset.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    let max = notes.len().saturating_sub(1);
                    if offset < max {
                        offset += 1;
                    }
                }
                KeyCode::PageUp => offset = offset.saturating_sub(10),
                KeyCode::PageDown => offset = (offset + 10).min(notes.len().saturating_sub(1)),
                code if is_cancel_key(code) => break,
                _ => {}
            }
        }
    }
    Ok(())
}

// ── Spinner ───────────────────────────────────────────────────────────────────

pub fn spinner_line(label: &str, frame: usize) -> Line<'_> {
    Line::from(vec![
        Span::styled("[LOADING] ", accent_style()),
        Span::raw(format!("{label} {}", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()])),
    ])
}

/// Run `work` on a worker thread, animating a spinner under `notes` until it
/// returns.
pub fn with_spinner<T, F>(
    terminal: &mut Term,
    title: &str,
    notes: &[Note],
    label: &str,
    work: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(work());
    });

    let started = Instant::now();
    loop {
        let frame = (started.elapsed().as_millis() / 100) as usize;
        draw_frame(terminal, |f| draw_progress(f, title, notes, Some((label, frame))))?;
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(value) => return Ok(value),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                anyhow::bail!("worker for '{label}' stopped unexpectedly")
            }
        }
    }
}

/// Output so far, tail-aligned, with an optional spinner as the last row.
pub fn draw_progress(f: &mut Frame, title: &str, notes: &[Note], spinner: Option<(&str, usize)>) {
    let screen = screen_layout(f, title);
    let room = screen.body.height as usize;
    let reserved = usize::from(spinner.is_some());
    let skip = (notes.len() + reserved).saturating_sub(room);
    let mut lines: Vec<Line> = notes.iter().skip(skip).map(Note::to_line).collect();
    if let Some((label, frame)) = spinner {
        lines.push(spinner_line(label, frame));
    }
    f.render_widget(Paragraph::new(lines), screen.body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_in_several_languages() {
        for yes in ["y", "Yes", " yup ", "ja", "YESSIR", "yep", "ye"] {
            assert_eq!(parse_answer(yes), Some(true), "{yes}");
        }
        for no in ["n", "NO", "nah", "ne", "nein", "na", "nope"] {
            assert_eq!(parse_answer(no), Some(false), "{no}");
        }
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn hotkeys_match_case_insensitively() {
        let items = [MenuItem::back("Return"), MenuItem::new('1', "Timer"), MenuItem::new('u', "Update")];
        assert_eq!(match_hotkey(&items, KeyCode::Char('1')), Some(MenuResult::Selected('1')));
        assert_eq!(match_hotkey(&items, KeyCode::Char('U')), Some(MenuResult::Selected('u')));
        assert_eq!(match_hotkey(&items, KeyCode::Char('0')), Some(MenuResult::Back));
        assert_eq!(match_hotkey(&items, KeyCode::Esc), Some(MenuResult::Back));
        assert_eq!(match_hotkey(&items, KeyCode::Char('7')), None);
        assert_eq!(match_hotkey(&items, KeyCode::Tab), None);
    }

    #[test]
    fn separators_span_the_width() {
        assert_eq!(separator_text(4), "#══#");
        assert_eq!(separator_text(1), "#");
        assert_eq!(separator_text(70).chars().count(), 70);
    }

    #[test]
    fn indented_output_keeps_every_line() {
        let notes = Note::indented("a\nb");
        assert_eq!(notes, vec![Note::plain("  a"), Note::plain("  b")]);
    }

    #[test]
    fn command_titles_are_framed() {
        assert_eq!(command_title("Cleanup"), "#   Cleanup   #");
    }
}
