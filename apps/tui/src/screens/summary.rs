//! "Summary" screen: completion message, exports, and the changes summary.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use mirreview_core::{ChangeKind, ExportKind, ReviewAction, ReviewSession};

use super::Intent;

pub(crate) struct SummaryScreen {
    /// Exports written during this session, newest last.
    written: Vec<PathBuf>,
}

impl SummaryScreen {
    pub(crate) fn new() -> Self {
        Self {
            written: Vec::new(),
        }
    }

    pub(crate) fn record_export(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    pub(crate) fn clear(&mut self) {
        self.written.clear();
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &ReviewSession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Banner
                Constraint::Length(self.written.len().min(4) as u16 + 2), // Exports
                Constraint::Min(3),    // Changes
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let total = session.progress().total;
        let reassigned = session
            .publications()
            .iter()
            .filter(|r| r.is_reassigned())
            .count();
        let banner = Paragraph::new(format!(
            "Review complete! {total} publications reviewed, {reassigned} reassigned."
        ))
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(banner, chunks[0]);

        let exports: Vec<ListItem> = if self.written.is_empty() {
            vec![ListItem::new("Nothing exported yet.")]
        } else {
            self.written
                .iter()
                .rev()
                .take(4)
                .map(|p| ListItem::new(p.display().to_string()))
                .collect()
        };
        f.render_widget(
            List::new(exports).block(Block::default().borders(Borders::ALL).title(" Exports ")),
            chunks[1],
        );

        let changes = session.changes();
        let title = format!(" Changes summary ({}) ", changes.len());
        let items: Vec<ListItem> = if changes.is_empty() {
            vec![ListItem::new("No changes made to topic assignments.")]
        } else {
            changes
                .iter()
                .map(|c| {
                    let color = match c.kind {
                        ChangeKind::Added => Color::Green,
                        ChangeKind::Removed => Color::Red,
                    };
                    ListItem::new(c.to_string()).style(Style::default().fg(color))
                })
                .collect()
        };
        f.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
            chunks[2],
        );

        f.render_widget(
            Paragraph::new("c write CSV · m write markdown · [ back to last record · r start new review")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[3],
        );
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        session: &ReviewSession,
    ) -> Option<Intent> {
        match code {
            KeyCode::Char('c') => Some(Intent::Export(ExportKind::Csv)),
            KeyCode::Char('m') => Some(Intent::Export(ExportKind::Markdown)),
            KeyCode::Char('[') => {
                let last = session.progress().total.saturating_sub(1);
                Some(Intent::Review(ReviewAction::Jump(last)))
            }
            KeyCode::Char('r') => Some(Intent::Review(ReviewAction::StartOver)),
            KeyCode::Char('o') => Some(Intent::OpenLoad),
            _ => None,
        }
    }
}
