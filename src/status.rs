use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use chrono::Local;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::metrics::{format_percent, ram_usage_percent, uptime};
use crate::ui::sel_style;

// ── Cached system info ────────────────────────────────────────────────────────

#[derive(Clone)]
struct StatusCache { uptime: String, ram: String, ts: Instant }
static CACHE: Mutex<Option<StatusCache>> = Mutex::new(None);

const CACHE_TTL: Duration = Duration::from_secs(5);

fn cached_readings() -> (String, String) {
    let Ok(mut guard) = CACHE.lock() else {
        return (String::new(), String::new());
    };
    if guard.as_ref().map_or(true, |c| c.ts.elapsed() > CACHE_TTL) {
        *guard = Some(StatusCache {
            uptime: uptime(),
            ram: format_percent(ram_usage_percent()),
            ts: Instant::now(),
        });
    }
    guard
        .as_ref()
        .map(|c| (c.uptime.clone(), c.ram.clone()))
        .unwrap_or_default()
}

pub fn status_right(uptime: &str, ram: &str) -> String {
    if uptime.is_empty() {
        return String::new();
    }
    format!("Up {uptime}  RAM {ram} ")
}

// ── Status bar ────────────────────────────────────────────────────────────────

pub fn render_status_bar(f: &mut Frame, area: Rect) {
    if area.height == 0 { return; }

    let now = Local::now().format("%H:%M:%S  %d.%m.%Y").to_string();
    let (up, ram) = cached_readings();
    let right_text = status_right(&up, &ram);

    let left  = Span::styled(format!(" {now}"), sel_style());
    let right = Span::styled(right_text.clone(), sel_style());

    // Pad center
    let used = now.chars().count() + 1 + right_text.chars().count();
    let pad  = " ".repeat((area.width as usize).saturating_sub(used));

    let line = Line::from(vec![left, Span::styled(pad, sel_style()), right]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_side_is_empty_without_readings() {
        assert_eq!(status_right("", ""), "");
        assert_eq!(status_right("3H:07M", "41%"), "Up 3H:07M  RAM 41% ");
    }
}
