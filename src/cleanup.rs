use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::alert;
use crate::config::{get_settings, step_delay, ExtraCleanupTask};
use crate::metrics::partition_used_bytes;
use crate::platform::{cleanup_tasks, CleanupTask, Platform};
use crate::shell::{run_command, ShellError};
use crate::ui::{confirm, pager, with_spinner, Note, Term};

const TITLE: &str = "Cleanup";
const AFTER_TASK: Duration = Duration::from_millis(200);

/// Built-in tasks for `platform` followed by the user's own.
pub fn all_tasks(platform: &Platform, extra: &[ExtraCleanupTask]) -> Vec<CleanupTask> {
    let mut tasks = cleanup_tasks(platform);
    tasks.extend(
        extra
            .iter()
            .filter(|t| !t.argv.is_empty())
            .map(|t| CleanupTask { desc: t.desc.clone(), argv: t.argv.clone() }),
    );
    tasks
}

pub fn task_notes(desc: &str, result: &Result<String, ShellError>) -> Vec<Note> {
    match result {
        Ok(output) => {
            let mut notes = vec![Note::info(format!("{desc} finished"))];
            notes.extend(Note::indented(output));
            notes
        }
        Err(e) => {
            let mut notes = vec![
                Note::error(format!("{desc} failed")),
                Note::plain(format!("  Error: {e}")),
            ];
            if let Some(out) = e.output() {
                notes.extend(Note::indented(out));
            }
            notes
        }
    }
}

/// Space freed between two readings. Growth counts as nothing freed.
pub fn freed_mb(before: u64, after: u64) -> f64 {
    before.saturating_sub(after) as f64 / 1024.0 / 1024.0
}

fn used_here() -> Option<u64> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    partition_used_bytes(&cwd)
}

pub fn clean_system(terminal: &mut Term) -> Result<()> {
    if !confirm(terminal, TITLE, "Are you sure you want to do a cleanup?")? {
        return Ok(());
    }

    let mut notes: Vec<Note> = Vec::new();
    let Some(before) = used_here() else {
        notes.push(Note::error("Could not read disk usage of the current partition"));
        return pager(terminal, TITLE, &notes);
    };

    let settings = get_settings();
    let tasks = all_tasks(&Platform::current(), &settings.extra_cleanup);
    let delay = step_delay();
    tracing::info!(tasks = tasks.len(), "cleanup started");

    for task in tasks {
        let label = format!("Running: {}", task.desc);
        let argv = task.argv.clone();
        let result = with_spinner(terminal, TITLE, &notes, &label, move || {
            std::thread::sleep(delay);
            run_command(&argv)
        })?;
        match &result {
            Ok(_) => tracing::info!(task = %task.desc, "cleanup task finished"),
            Err(e) => tracing::warn!(task = %task.desc, error = %e, "cleanup task failed"),
        }
        notes.extend(task_notes(&task.desc, &result));
        std::thread::sleep(AFTER_TASK);
    }

    match used_here() {
        Some(after) => {
            let mb = freed_mb(before, after);
            tracing::info!(freed_mb = mb, "cleanup finished");
            notes.push(Note::success(format!("Cleanup finished. Cleaned: {mb:.2} MB")));
        }
        None => notes.push(Note::error("Could not read disk usage after cleanup")),
    }
    alert::alarm();
    pager(terminal, TITLE, &notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_tasks_are_appended_and_empty_ones_dropped() {
        let extra = vec![
            ExtraCleanupTask { desc: "npm".into(), argv: vec!["npm".into(), "cache".into()] },
            ExtraCleanupTask { desc: "broken".into(), argv: vec![] },
        ];
        let tasks = all_tasks(&Platform::Linux, &extra);
        assert_eq!(tasks.len(), 11);
        assert_eq!(tasks.last().unwrap().desc, "npm");
    }

    #[test]
    fn success_notes_indent_output() {
        let notes = task_notes("Cleaning Trash", &Ok("removed 3 files\ndone".into()));
        assert_eq!(
            notes,
            vec![
                Note::info("Cleaning Trash finished"),
                Note::plain("  removed 3 files"),
                Note::plain("  done"),
            ]
        );
        assert_eq!(task_notes("Quiet", &Ok(String::new())).len(), 1);
    }

    #[test]
    fn failure_notes_carry_the_error() {
        let notes = task_notes("Cleaning Apt Cache", &Err(ShellError::Empty));
        assert_eq!(notes[0], Note::error("Cleaning Apt Cache failed"));
        assert_eq!(notes[1], Note::plain("  Error: command is empty"));
    }

    #[test]
    fn freed_space_never_negative() {
        assert_eq!(freed_mb(3 * 1024 * 1024, 1024 * 1024), 2.0);
        assert_eq!(freed_mb(1, 5), 0.0);
    }
}
