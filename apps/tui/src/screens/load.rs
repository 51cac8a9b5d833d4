//! "Load" screen: document path input and the list of resumable autosaves.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use mirreview_storage::SnapshotSummary;

use super::Intent;

/// Which pane has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Path,
    Autosaves,
}

pub(crate) struct LoadScreen {
    path: String,
    focus: Focus,
    autosaves: Vec<SnapshotSummary>,
    selected: usize,
}

impl LoadScreen {
    pub(crate) fn new(initial_path: Option<String>) -> Self {
        Self {
            path: initial_path.unwrap_or_default(),
            focus: Focus::Path,
            autosaves: Vec::new(),
            selected: 0,
        }
    }

    /// Typing goes into the path field.
    pub(crate) fn is_editing(&self) -> bool {
        self.focus == Focus::Path
    }

    pub(crate) fn set_autosaves(&mut self, autosaves: Vec<SnapshotSummary>) {
        self.autosaves = autosaves;
        self.selected = self.selected.min(self.autosaves.len().saturating_sub(1));
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Path
                Constraint::Length(2), // Hint
                Constraint::Min(1),    // Autosaves
            ])
            .split(area);

        let path_style = if self.focus == Focus::Path {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let path_block = Block::default()
            .borders(Borders::ALL)
            .title(" Document (.docx or .md) ")
            .border_style(path_style);
        f.render_widget(Paragraph::new(self.path.as_str()).block(path_block), chunks[0]);

        let hint = match self.focus {
            Focus::Path => "Type a path · Enter to load · Tab to autosaves",
            Focus::Autosaves => "↑/↓ select · Enter to resume · r refresh · Tab to path",
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[1],
        );

        let list_style = if self.focus == Focus::Autosaves {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        if self.autosaves.is_empty() {
            let empty = Paragraph::new("No autosaved reviews.")
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Autosaves ")
                        .border_style(list_style),
                );
            f.render_widget(empty, chunks[2]);
            return;
        }

        let items: Vec<ListItem> = self
            .autosaves
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let is_selected = i == self.selected && self.focus == Focus::Autosaves;
                let style = if is_selected {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let prefix = if is_selected { "▸ " } else { "  " };
                ListItem::new(format!(
                    "{prefix}{}  {}/{}  {}  ({})",
                    s.file_name,
                    s.cursor,
                    s.total,
                    s.saved_at.format("%Y-%m-%d %H:%M"),
                    s.fingerprint.short()
                ))
                .style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Autosaves ({}) ", self.autosaves.len()))
                .border_style(list_style),
        );
        f.render_widget(list, chunks[2]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Option<Intent> {
        match (self.focus, code) {
            (_, KeyCode::Tab | KeyCode::BackTab) => {
                self.focus = match self.focus {
                    Focus::Path => Focus::Autosaves,
                    Focus::Autosaves => Focus::Path,
                };
                None
            }
            (Focus::Path, KeyCode::Enter) => {
                let path = self.path.trim();
                if path.is_empty() {
                    None
                } else {
                    Some(Intent::LoadFile(PathBuf::from(path)))
                }
            }
            (Focus::Path, KeyCode::Backspace) => {
                self.path.pop();
                None
            }
            (Focus::Path, KeyCode::Char(c)) => {
                self.path.push(c);
                None
            }
            (Focus::Autosaves, KeyCode::Up | KeyCode::Char('k')) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (Focus::Autosaves, KeyCode::Down | KeyCode::Char('j')) => {
                if self.selected + 1 < self.autosaves.len() {
                    self.selected += 1;
                }
                None
            }
            (Focus::Autosaves, KeyCode::Char('r')) => Some(Intent::RefreshAutosaves),
            (Focus::Autosaves, KeyCode::Enter) => self
                .autosaves
                .get(self.selected)
                .map(|s| Intent::Resume(s.fingerprint.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(screen: &mut LoadScreen, s: &str) {
        for c in s.chars() {
            screen.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn enter_loads_typed_path() {
        let mut screen = LoadScreen::new(None);
        assert!(screen.handle_key(KeyCode::Enter, KeyModifiers::NONE).is_none());
        type_str(&mut screen, "may.mdx");
        screen.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        match screen.handle_key(KeyCode::Enter, KeyModifiers::NONE) {
            Some(Intent::LoadFile(path)) => assert_eq!(path, PathBuf::from("may.md")),
            other => panic!("expected LoadFile, got {other:?}"),
        }
    }

    #[test]
    fn tab_moves_focus_to_autosaves() {
        let mut screen = LoadScreen::new(Some("may.md".into()));
        assert!(screen.is_editing());
        screen.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert!(!screen.is_editing());
        assert!(matches!(
            screen.handle_key(KeyCode::Char('r'), KeyModifiers::NONE),
            Some(Intent::RefreshAutosaves)
        ));
        // Nothing to resume yet.
        assert!(screen.handle_key(KeyCode::Enter, KeyModifiers::NONE).is_none());
    }
}
