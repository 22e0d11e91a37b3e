use anyhow::Result;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;

use crate::config::get_settings;
use crate::metrics::{format_percent, usage_bar, Sampler, Snapshot};
use crate::ticker::{run_ticker, Flow, Outcome, Tick};
use crate::ui::{accent_style, separator_text, Term};

pub struct SystemMonitor {
    sampler: Sampler,
    refresh: Duration,
    latest: Option<Snapshot>,
}

impl SystemMonitor {
    pub fn new(top_n: usize, refresh: Duration) -> Self {
        Self { sampler: Sampler::new(top_n), refresh, latest: None }
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("# {text}:"), accent_style()))
}

fn tree_rows(rows: &[String]) -> Vec<Line<'static>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let prefix = if i + 1 == rows.len() { "└" } else { "├" };
            Line::from(format!(" {prefix}{row}"))
        })
        .collect()
}

/// Dashboard text for one snapshot.
pub fn dashboard_lines(snap: &Snapshot, width: u16) -> Vec<Line<'static>> {
    let sep = || Line::from(Span::styled(separator_text(width), accent_style()));
    let cpu = snap.cpu_percent as f64;
    let mut lines = vec![
        heading("CPU Info"),
        Line::from(format!("└┬CPU Cores: {}", snap.cpu_cores)),
        Line::from(format!(" └Usage    : {} {}", format_percent(cpu), usage_bar(cpu))),
        Line::from(Span::styled(" # Top CPU Tasks:", accent_style())),
    ];
    lines.extend(tree_rows(&snap.top_tasks));
    lines.push(sep());

    lines.push(heading("RAM Info"));
    lines.push(Line::from(format!("└┬Total RAM: {} MB", snap.ram_total_mb)));
    lines.push(Line::from(format!(
        " └Usage    : {} {}",
        format_percent(snap.ram_percent),
        usage_bar(snap.ram_percent)
    )));
    lines.push(sep());

    lines.push(heading("Disk Info"));
    lines.push(Line::from(format!("└┬Disk Name : {}", snap.disk.mount_point)));
    lines.push(Line::from(format!(" ├Total     : {:.0} GB", snap.disk.total_gb)));
    lines.push(Line::from(format!(
        " └Used      : {} {}",
        format_percent(snap.disk.used_percent),
        usage_bar(snap.disk.used_percent)
    )));
    lines
}

impl Tick for SystemMonitor {
    fn title(&self) -> &str {
        "System Monitor"
    }

    fn interval(&self) -> Duration {
        self.refresh
    }

    fn tick(&mut self) -> Flow {
        self.latest = Some(self.sampler.sample());
        Flow::Continue
    }

    fn draw(&self, f: &mut Frame, area: Rect) {
        let lines = match &self.latest {
            Some(snap) => dashboard_lines(snap, area.width),
            None => vec![Line::from("Collecting...")],
        };
        f.render_widget(Paragraph::new(lines), area);
    }

    fn hint(&self) -> &str {
        "Press [Enter] to stop the System Monitor"
    }
}

pub fn system_monitor(terminal: &mut Term) -> Result<()> {
    let s = get_settings();
    let mut monitor = SystemMonitor::new(
        s.top_processes.max(1),
        Duration::from_millis(s.monitor_refresh_ms.max(250)),
    );
    let outcome = run_ticker(terminal, &mut monitor)?;
    if outcome == Outcome::Cancelled {
        tracing::info!("system monitor stopped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DiskSummary;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn dashboard_shows_every_section() {
        let snap = Snapshot {
            cpu_cores: 8,
            cpu_percent: 42.4,
            top_tasks: vec!["cargo".into(), "...".into()],
            ram_total_mb: 16000,
            ram_percent: 50.0,
            disk: DiskSummary { mount_point: "/".into(), total_gb: 476.6, used_percent: 71.0 },
        };
        let rows = text(&dashboard_lines(&snap, 20));
        assert!(rows.contains(&"└┬CPU Cores: 8".to_string()));
        assert!(rows.contains(&" └Usage    : 42% [████░░░░░░]".to_string()));
        assert!(rows.contains(&" ├cargo".to_string()));
        assert!(rows.contains(&" └...".to_string()));
        assert!(rows.contains(&"└┬Total RAM: 16000 MB".to_string()));
        assert!(rows.contains(&" ├Total     : 477 GB".to_string()));
        assert!(rows.contains(&" └Used      : 71% [███████░░░]".to_string()));
        assert_eq!(rows.iter().filter(|r| r.starts_with('#') && r.ends_with('#')).count(), 2);
    }
}
