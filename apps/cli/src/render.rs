//! Terminal rendering of the log panel, config and history views.

use client_core::{
    config_form::ConfigDraft,
    history::{HistoryView, EMPTY_HISTORY},
    log::{LogLine, Segment},
    session::SessionUpdate,
};
use colored::{ColoredString, Colorize};
use shared::domain::{LogKind, SessionStatus};
use tracing::debug;

fn paint(kind: LogKind, text: &str) -> ColoredString {
    match kind {
        LogKind::Normal => text.normal(),
        LogKind::System => text.cyan(),
        LogKind::Error => text.red(),
        LogKind::Highlight => text.yellow().bold(),
        LogKind::Success => text.green(),
    }
}

pub fn log_line(line: &LogLine) -> String {
    line.segments()
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => paint(line.kind(), text).to_string(),
            Segment::Link(url) => paint(line.kind(), url).underline().to_string(),
        })
        .collect()
}

pub fn status_badge(status: SessionStatus) -> String {
    let label = format!("● {}", status.label());
    match status {
        SessionStatus::Idle => label.dimmed().to_string(),
        SessionStatus::Running => label.green().bold().to_string(),
        SessionStatus::Stopped | SessionStatus::Errored => label.red().bold().to_string(),
    }
}

/// Log lines go to stdout; status changes go to stderr.
pub fn print_updates(updates: &[SessionUpdate]) {
    for update in updates {
        match update {
            SessionUpdate::LogAppended(line) => println!("{}", log_line(line)),
            SessionUpdate::StatusChanged(status) => eprintln!("{}", status_badge(*status)),
            SessionUpdate::ControlChanged(control) => debug!(?control, "action control changed"),
            SessionUpdate::LogCleared => debug!("log cleared"),
        }
    }
}

pub fn config(draft: &ConfigDraft) -> String {
    let mut out = String::new();
    out.push_str(&format!("MeTube URL      : {}\n", draft.metube_url));
    out.push_str(&format!("Schedule interval: {}\n", draft.interval()));
    out.push_str(&format!("{}\n", draft.last_run_label()));
    if draft.playlists.is_empty() {
        out.push_str("Playlists       : (none)\n");
        return out;
    }
    out.push_str("Playlists:\n");
    for playlist in &draft.playlists {
        out.push_str(&format!(
            "  - {} -> {}\n      url: {}\n",
            playlist.name, playlist.folder, playlist.url
        ));
        if !playlist.metube_folder.is_empty() {
            out.push_str(&format!("      metube folder: {}\n", playlist.metube_folder));
        }
    }
    out
}

pub fn history(view: &HistoryView, search: Option<&str>) -> String {
    let rows = view.search(search.unwrap_or_default());
    if rows.is_empty() {
        return format!("{EMPTY_HISTORY}\n");
    }

    let id_width = rows.iter().map(|e| e.id.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|entry| {
            let pad = id_width.saturating_sub(entry.id.chars().count());
            format!("{}{}  {}\n", entry.id, " ".repeat(pad), entry.filename)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use client_core::config_form::PlaylistDraft;
    use shared::protocol::HistoryEntry;

    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn log_line_keeps_link_text_without_trailing_paren() {
        plain();
        let line = LogLine::normal("see http://example.com/a)");
        assert_eq!(log_line(&line), "see http://example.com/a)");
    }

    #[test]
    fn history_renders_empty_state() {
        plain();
        let view = HistoryView::new(Vec::new());
        assert_eq!(history(&view, None), "기록이 없습니다.\n");
    }

    #[test]
    fn history_aligns_ids_and_applies_search() {
        plain();
        let view = HistoryView::new(vec![
            HistoryEntry {
                id: "a".into(),
                filename: "one.m4a".into(),
            },
            HistoryEntry {
                id: "bbbb".into(),
                filename: "two.m4a".into(),
            },
        ]);

        assert_eq!(history(&view, None), "bbbb  two.m4a\na     one.m4a\n");
        assert_eq!(history(&view, Some("ONE")), "a  one.m4a\n");
        assert_eq!(history(&view, Some("zzz")), "기록이 없습니다.\n");
    }

    #[test]
    fn config_lists_playlists_and_last_run() {
        let draft = ConfigDraft {
            metube_url: "http://metube:8081".into(),
            schedule_interval: "6".into(),
            last_run: None,
            playlists: vec![PlaylistDraft {
                name: "mix".into(),
                url: "https://y/1".into(),
                folder: "/music/mix".into(),
                metube_folder: "mix".into(),
            }],
        };

        let text = config(&draft);

        assert!(text.contains("최근 실행: 기록 없음"));
        assert!(text.contains("  - mix -> /music/mix"));
        assert!(text.contains("metube folder: mix"));
    }
}
