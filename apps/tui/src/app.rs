//! Core TUI application state and event loop.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use mirreview_core::{
    ExportKind, Ingestor, PandocConverter, ReviewAction, ReviewEdit, ReviewSession,
    SilentProgress, write_export,
};
use mirreview_shared::{AppConfig, ConverterOptions, DocumentFingerprint, autosave_db_path};
use mirreview_storage::Storage;

use crate::screens::load::LoadScreen;
use crate::screens::review::ReviewScreen;
use crate::screens::summary::SummaryScreen;
use crate::screens::{Intent, ScreenId};
use crate::widgets::status_bar;

/// Application state.
pub(crate) struct App {
    /// Drives the async ingest and storage calls from the sync event loop.
    runtime: Runtime,
    config: AppConfig,
    ingestor: Ingestor<PandocConverter>,
    /// `None` when the autosave database could not be opened.
    storage: Option<Storage>,
    session: ReviewSession,
    /// Currently active screen.
    pub active: ScreenId,
    load: LoadScreen,
    review: ReviewScreen,
    summary: SummaryScreen,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
}

impl App {
    pub(crate) fn new(config: AppConfig, initial_path: Option<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let converter = PandocConverter::new(&ConverterOptions::from(&config));
        let ingestor = Ingestor::from_config(&config, converter)?;

        let storage = match autosave_db_path(&config) {
            Ok(path) => match runtime.block_on(Storage::open(&path)) {
                Ok(storage) => Some(storage),
                Err(e) => {
                    warn!(error = %e, "autosave disabled");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "autosave disabled");
                None
            }
        };

        let status = if storage.is_some() {
            "Ready. Press ? for help".to_string()
        } else {
            "Autosave unavailable. Press ? for help".to_string()
        };

        let mut app = Self {
            runtime,
            config,
            ingestor,
            storage,
            session: ReviewSession::new(),
            active: ScreenId::Load,
            load: LoadScreen::new(initial_path),
            review: ReviewScreen::new(),
            summary: SummaryScreen::new(),
            should_quit: false,
            status,
            show_help: false,
        };
        app.refresh_autosaves();
        Ok(app)
    }

    /// Screen matching the session: nothing loaded, in progress, or done.
    fn screen_for_session(&self) -> ScreenId {
        if !self.session.is_loaded() {
            ScreenId::Load
        } else if self.session.is_complete() {
            ScreenId::Summary
        } else {
            ScreenId::Review
        }
    }

    fn is_editing(&self) -> bool {
        match self.active {
            ScreenId::Load => self.load.is_editing(),
            ScreenId::Review => self.review.is_editing(),
            ScreenId::Summary => false,
        }
    }

    pub(crate) fn perform(&mut self, intent: Intent) {
        match intent {
            Intent::LoadFile(path) => self.load_file(&path),
            Intent::Resume(fingerprint) => self.resume(&fingerprint),
            Intent::RefreshAutosaves => self.refresh_autosaves(),
            Intent::Review(action) => self.apply(action),
            Intent::Export(kind) => self.export(kind),
            Intent::OpenLoad => {
                self.refresh_autosaves();
                self.active = ScreenId::Load;
            }
        }
    }

    fn load_file(&mut self, path: &Path) {
        let document = match self
            .runtime
            .block_on(self.ingestor.load_path(path, &SilentProgress))
        {
            Ok(document) => document,
            Err(e) => {
                self.status = format!("Error: {e}");
                return;
            }
        };

        let saved = self.storage.as_ref().and_then(|storage| {
            self.runtime
                .block_on(storage.load_snapshot(&document.fingerprint))
                .unwrap_or_else(|e| {
                    warn!(error = %e, "could not read autosave");
                    None
                })
        });

        let count = document.publications.len();
        let file_name = document.file_name.clone();
        match saved {
            Some(snapshot) => {
                let cursor = snapshot.cursor;
                self.apply(ReviewAction::Restore {
                    document: snapshot.document,
                    cursor,
                });
                self.status = format!("Resumed {file_name} at {cursor} / {count}");
            }
            None => {
                self.apply(ReviewAction::Load(document));
                self.status = if count == 0 {
                    format!("No publications found in {file_name}")
                } else {
                    format!("Loaded {count} publications from {file_name}")
                };
            }
        }
    }

    fn resume(&mut self, fingerprint: &DocumentFingerprint) {
        let Some(storage) = &self.storage else {
            return;
        };
        match self.runtime.block_on(storage.load_snapshot(fingerprint)) {
            Ok(Some(snapshot)) => {
                let file_name = snapshot.document.file_name.clone();
                self.apply(ReviewAction::Restore {
                    document: snapshot.document,
                    cursor: snapshot.cursor,
                });
                self.status = format!("Resumed {file_name}");
            }
            Ok(None) => self.status = "Autosave no longer exists".to_string(),
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    /// Apply a session transition, then sync screens and autosave.
    fn apply(&mut self, action: ReviewAction) {
        let replaces_document = matches!(
            action,
            ReviewAction::Load(_) | ReviewAction::Restore { .. } | ReviewAction::StartOver
        );
        let status = match &action {
            ReviewAction::SaveAndNext(_) => Some("Saved"),
            ReviewAction::Skip if self.has_unsaved_edit() => {
                Some("No changes: checklist edits were discarded")
            }
            ReviewAction::Skip => Some("No changes"),
            ReviewAction::StartOver => Some("Ready for a new document"),
            _ => None,
        };
        let discarded = match &action {
            ReviewAction::StartOver => self.session.document().map(|d| d.fingerprint.clone()),
            _ => None,
        };

        self.session = self.session.apply(action);
        if let Some(fingerprint) = discarded {
            self.forget_autosave(&fingerprint);
        }

        if replaces_document {
            self.review.sync(None);
            self.summary.clear();
        }
        self.review.sync(self.session.current());
        self.active = self.screen_for_session();
        if let Some(status) = status {
            self.status = status.to_string();
        }

        self.autosave();
        if self.active == ScreenId::Load {
            self.refresh_autosaves();
        }
    }

    /// Whether the review screen holds topics or notes that differ from the
    /// record under the cursor.
    fn has_unsaved_edit(&self) -> bool {
        let Some(record) = self.session.current() else {
            return false;
        };
        let mut shown = self.review.edit();
        let mut stored = ReviewEdit::from_record(record);
        shown.assigned_topics.sort();
        stored.assigned_topics.sort();
        shown != stored
    }

    /// Drop the autosave of a discarded review so reloading starts fresh.
    fn forget_autosave(&mut self, fingerprint: &DocumentFingerprint) {
        let Some(storage) = &self.storage else {
            return;
        };
        match self.runtime.block_on(storage.delete_snapshot(fingerprint)) {
            Ok(removed) => info!(fingerprint = %fingerprint.short(), removed, "autosave discarded"),
            Err(e) => warn!(error = %e, "could not discard autosave"),
        }
    }

    fn autosave(&mut self) {
        let (Some(storage), Some(snapshot)) = (&self.storage, self.session.snapshot()) else {
            return;
        };
        if let Err(e) = self.runtime.block_on(storage.save_snapshot(&snapshot)) {
            warn!(error = %e, "autosave failed");
            self.status = format!("Autosave failed: {e}");
        }
    }

    fn export(&mut self, kind: ExportKind) {
        let dir = PathBuf::from(&self.config.defaults.output_dir);
        let order = self.config.defaults.markdown_order;
        match write_export(&self.session, kind, order, &dir) {
            Ok(path) => {
                if let (Some(storage), Some(doc)) = (&self.storage, self.session.document()) {
                    let logged = self.runtime.block_on(storage.record_export(
                        &doc.fingerprint,
                        kind.as_str(),
                        &path.to_string_lossy(),
                    ));
                    if let Err(e) = logged {
                        warn!(error = %e, "could not log export");
                    }
                }
                info!(path = %path.display(), "exported");
                self.status = format!("Wrote {}", path.display());
                self.summary.record_export(path);
            }
            Err(e) => self.status = format!("Export failed: {e}"),
        }
    }

    fn refresh_autosaves(&mut self) {
        let Some(storage) = &self.storage else {
            return;
        };
        match self.runtime.block_on(storage.list_snapshots()) {
            Ok(list) => self.load.set_autosaves(list),
            Err(e) => warn!(error = %e, "could not list autosaves"),
        }
    }
}

/// Set up the terminal, run the event loop, restore the terminal.
pub(crate) fn run(app: App) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        KeyCode::Esc if app.active == ScreenId::Load && app.session.is_loaded() => {
            app.active = app.screen_for_session();
            return;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Delegate to current screen
    let intent = match app.active {
        ScreenId::Load => app.load.handle_key(code, modifiers),
        ScreenId::Review => app.review.handle_key(code, modifiers),
        ScreenId::Summary => app.summary.handle_key(code, modifiers, &app.session),
    };
    if let Some(intent) = intent {
        app.perform(intent);
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let tab_titles: Vec<Line> = ScreenId::ALL
        .iter()
        .map(|s| Line::from(format!("{s}")))
        .collect();

    let title = match app.session.document() {
        Some(doc) => format!(" Month in Review: {} ", doc.file_name),
        None => " Month in Review ".to_string(),
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(app.active.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area
    match app.active {
        ScreenId::Load => app.load.draw(f, chunks[1]),
        ScreenId::Review => app.review.draw(f, chunks[1], &app.session),
        ScreenId::Summary => app.summary.draw(f, chunks[1], &app.session),
    }

    f.render_widget(status_bar(&app.status), chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from("  o            Open another document"),
        Line::from(""),
        Line::from("Review:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Move through topics"),
        Line::from("  Space        Toggle topic"),
        Line::from("  n            Edit notes"),
        Line::from("  Enter        Save & next"),
        Line::from("  ]            No changes, next"),
        Line::from("  [            Save & previous"),
        Line::from("  x            Write progress CSV"),
        Line::from(""),
        Line::from("Summary:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  c / m        Write CSV / markdown"),
        Line::from("  r            Start new review"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (any key closes) ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures")
            .join(name)
    }

    fn test_app(dir: &Path) -> App {
        let mut config = AppConfig::default();
        config.defaults.output_dir = dir.join("out").to_string_lossy().to_string();
        config.storage.autosave_db = Some(dir.join("autosave.db").to_string_lossy().to_string());
        App::new(config, None).expect("app")
    }

    #[test]
    fn load_review_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert_eq!(app.active, ScreenId::Load);

        app.perform(Intent::LoadFile(fixture_path("markdown/month_in_review.md")));
        assert_eq!(app.active, ScreenId::Review);
        assert_eq!(app.session.progress().total, 5);

        app.perform(Intent::Review(ReviewAction::SaveAndNext(ReviewEdit::new(
            vec!["Housing".into()],
            "moved",
        ))));
        assert_eq!(app.session.cursor(), 1);

        // Autosaved after the action.
        let storage = app.storage.as_ref().unwrap();
        let listed = app.runtime.block_on(storage.list_snapshots()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].cursor, 1);

        app.perform(Intent::Review(ReviewAction::Jump(5)));
        assert_eq!(app.active, ScreenId::Summary);
        app.perform(Intent::Export(ExportKind::Markdown));
        assert!(dir.path().join("out/month_review_updated.md").exists());
        assert!(app.status.starts_with("Wrote"));
    }

    #[test]
    fn reload_resumes_autosave() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = fixture_path("markdown/month_in_review.md");
        {
            let mut app = test_app(dir.path());
            app.perform(Intent::LoadFile(fixture.clone()));
            app.perform(Intent::Review(ReviewAction::Skip));
            app.perform(Intent::Review(ReviewAction::Skip));
        }
        let mut app = test_app(dir.path());
        app.perform(Intent::LoadFile(fixture));
        assert_eq!(app.session.cursor(), 2);
        assert!(app.status.starts_with("Resumed"));
    }

    #[test]
    fn start_over_then_reload_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = fixture_path("markdown/month_in_review.md");
        let mut app = test_app(dir.path());
        app.perform(Intent::LoadFile(fixture.clone()));
        app.perform(Intent::Review(ReviewAction::SaveAndNext(ReviewEdit::new(
            vec!["Housing".into()],
            "old",
        ))));
        app.perform(Intent::Review(ReviewAction::Jump(5)));
        app.perform(Intent::Review(ReviewAction::StartOver));
        assert_eq!(app.active, ScreenId::Load);

        let storage = app.storage.as_ref().unwrap();
        assert!(app.runtime.block_on(storage.list_snapshots()).unwrap().is_empty());

        app.perform(Intent::LoadFile(fixture));
        assert_eq!(app.session.cursor(), 0);
        assert_eq!(app.active, ScreenId::Review);
        assert!(app.status.starts_with("Loaded"));
        let first = &app.session.publications()[0];
        assert_eq!(first.assigned_topics, first.original_topics);
        assert!(first.notes.is_empty());
    }

    #[test]
    fn skip_reports_discarded_edits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.perform(Intent::LoadFile(fixture_path("markdown/month_in_review.md")));

        app.perform(Intent::Review(ReviewAction::Skip));
        assert_eq!(app.status, "No changes");

        // Toggle the first checklist entry, then skip.
        handle_key(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        app.perform(Intent::Review(ReviewAction::Skip));
        assert_eq!(app.session.cursor(), 2);
        assert!(app.status.contains("discarded"));
    }

    #[test]
    fn failed_load_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.perform(Intent::LoadFile(fixture_path("markdown/month_in_review.md")));
        let before = app.session.clone();

        app.perform(Intent::LoadFile(dir.path().join("missing.md")));
        assert_eq!(app.session, before);
        assert!(app.status.starts_with("Error"));
    }

    #[test]
    fn draws_every_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();

        terminal.draw(|f| draw(f, &app)).unwrap();
        app.perform(Intent::LoadFile(fixture_path("markdown/month_in_review.md")));
        terminal.draw(|f| draw(f, &app)).unwrap();
        app.perform(Intent::Review(ReviewAction::Jump(5)));
        terminal.draw(|f| draw(f, &app)).unwrap();
        app.show_help = true;
        terminal.draw(|f| draw(f, &app)).unwrap();
    }

    #[test]
    fn quit_key_respects_editing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        // Path field has focus, so 'q' is typed.
        handle_key(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!app.should_quit);
        handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
