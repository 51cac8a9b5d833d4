//! "Review" screen: one publication at a time with a topic checklist.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use mirreview_core::{ExportKind, ReviewAction, ReviewEdit, ReviewSession};
use mirreview_shared::{CANONICAL_TOPICS, PublicationRecord};

use super::Intent;
use crate::widgets::{progress_gauge, publication_card};

pub(crate) struct ReviewScreen {
    /// Identifier the checklist was built for.
    identifier: Option<String>,
    /// Canonical topics, then any other labels the record carries.
    options: Vec<String>,
    checked: Vec<bool>,
    selected: usize,
    notes: String,
    editing_notes: bool,
}

impl ReviewScreen {
    pub(crate) fn new() -> Self {
        Self {
            identifier: None,
            options: CANONICAL_TOPICS.iter().map(|t| t.to_string()).collect(),
            checked: vec![false; CANONICAL_TOPICS.len()],
            selected: 0,
            notes: String::new(),
            editing_notes: false,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing_notes
    }

    /// Rebuild the checklist when the record under the cursor changes.
    pub(crate) fn sync(&mut self, record: Option<&PublicationRecord>) {
        let Some(record) = record else {
            self.identifier = None;
            return;
        };
        if self.identifier.as_deref() == Some(record.identifier.as_str()) {
            return;
        }

        let mut options: Vec<String> = CANONICAL_TOPICS.iter().map(|t| t.to_string()).collect();
        for topic in record.assigned_topics.iter().chain(&record.original_topics) {
            if !options.contains(topic) {
                options.push(topic.clone());
            }
        }
        self.checked = options
            .iter()
            .map(|o| record.assigned_topics.contains(o))
            .collect();
        self.options = options;
        self.notes = record.notes.clone();
        self.selected = 0;
        self.editing_notes = false;
        self.identifier = Some(record.identifier.clone());
    }

    /// Current checklist and notes as an edit.
    pub(crate) fn edit(&self) -> ReviewEdit {
        let topics = self
            .options
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(topic, _)| topic.clone())
            .collect();
        ReviewEdit::new(topics, self.notes.clone())
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &ReviewSession) {
        let Some(record) = session.current() else {
            f.render_widget(
                Paragraph::new("Nothing to review.").alignment(Alignment::Center),
                area,
            );
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Progress
                Constraint::Length(6), // Card
                Constraint::Min(5),    // Topics
                Constraint::Length(3), // Notes
                Constraint::Length(1), // Hint
            ])
            .split(area);

        f.render_widget(progress_gauge(session.progress()), chunks[0]);
        f.render_widget(publication_card(record), chunks[1]);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .zip(&self.checked)
            .map(|(topic, checked)| {
                let mark = if *checked { "[x]" } else { "[ ]" };
                let style = if record.original_topics.contains(topic) {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{mark} {topic}")).style(style)
            })
            .collect();
        let assigned = self.checked.iter().filter(|c| **c).count();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Assign topics ({assigned} selected) ")),
            )
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .highlight_symbol("▸ ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(list, chunks[2], &mut state);

        let notes_style = if self.editing_notes {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let notes = Paragraph::new(self.notes.as_str())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Notes (optional) ")
                    .border_style(notes_style),
            );
        f.render_widget(notes, chunks[3]);

        let hint = if self.editing_notes {
            "Type notes · Enter or Esc to finish"
        } else {
            "Space toggle · n notes · Enter save & next · ] no changes · [ previous · x progress CSV"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[4],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Option<Intent> {
        if self.editing_notes {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.editing_notes = false,
                KeyCode::Backspace => {
                    self.notes.pop();
                }
                KeyCode::Char(c) => self.notes.push(c),
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.options.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char(' ') => {
                if let Some(checked) = self.checked.get_mut(self.selected) {
                    *checked = !*checked;
                }
                None
            }
            KeyCode::Char('n') => {
                self.editing_notes = true;
                None
            }
            KeyCode::Enter => Some(Intent::Review(ReviewAction::SaveAndNext(self.edit()))),
            KeyCode::Char(']') => Some(Intent::Review(ReviewAction::Skip)),
            KeyCode::Char('[') => Some(Intent::Review(ReviewAction::Previous(self.edit()))),
            KeyCode::Char('x') => Some(Intent::Export(ExportKind::Csv)),
            KeyCode::Char('o') => Some(Intent::OpenLoad),
            _ => None,
        }
    }
}
