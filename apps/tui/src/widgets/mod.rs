//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};

use mirreview_core::Progress;
use mirreview_shared::PublicationRecord;

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Title, identifier, date, URL and original topics of one record.
pub(crate) fn publication_card(record: &PublicationRecord) -> Paragraph<'_> {
    let original = if record.original_topics.is_empty() {
        "(none)".to_string()
    } else {
        record.original_topics.join(", ")
    };
    let date = if record.date.is_empty() {
        "no date"
    } else {
        record.date.as_str()
    };

    let lines = vec![
        Line::from(record.title.as_str()).style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(format!("{} • {date}", record.identifier))
            .style(Style::default().fg(Color::Gray)),
        Line::from(record.source_url.as_str()).style(Style::default().fg(Color::Blue)),
        Line::from(vec![
            Span::styled("Original topics: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(original),
        ]),
    ];

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Publication "))
}

/// One-line progress gauge, `position / total (percent%)`.
pub(crate) fn progress_gauge(progress: Progress) -> Gauge<'static> {
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(u16::from(progress.percent.min(100)))
        .label(format!(
            "{} / {} ({}%)",
            progress.position, progress.total, progress.percent
        ))
}
