//! TUI implementation for medlens

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use medlens_pipeline::{Analyzer, Conversation, ImageFormat, WARNING_PREFIX};
use medlens_tui::{
    App, Theme,
    app::AppState,
    input::Action,
    widgets::{PathInput, Spinner, Thumbnail, TranscriptEntry, TranscriptView, transcript_height},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Result of a background analysis task
#[derive(Debug)]
enum AnalysisOutcome {
    /// Report text (or warning text) to append as an assistant turn
    Report(String),
    /// Staging failed before the image ever reached the model
    Failed(String),
}

/// TUI application state
pub struct TuiState {
    /// Session log, append-only
    log: Conversation,
    /// Display entries mirroring the log (plus app notes)
    entries: Vec<TranscriptEntry>,
    /// Path input box
    input: PathInput,
    /// Current scroll position in lines
    scroll: usize,
    /// Whether an analysis is in flight
    busy: bool,
    /// Current status message
    status: String,
    /// Theme
    theme: Theme,
    /// Analysis pipeline handle
    analyzer: Analyzer,
    /// Model id shown in the title bar
    model_id: String,
    /// Cancellation token for the in-flight analysis
    cancel: Option<CancellationToken>,
    /// Channel carrying outcomes back from spawned tasks
    outcome_tx: mpsc::Sender<AnalysisOutcome>,
    outcome_rx: mpsc::Receiver<AnalysisOutcome>,
    /// Spinner start time for animation
    spinner_start: Instant,
    /// Terminal width seen at last render, for input scrolling
    input_width: u16,
}

impl TuiState {
    pub fn new(analyzer: Analyzer, model_id: String, theme: Theme) -> Self {
        let mut input =
            PathInput::new().with_placeholder("Path to a medical image (jpg, png, bmp, gif)...");
        input.set_focused(true);

        let (outcome_tx, outcome_rx) = mpsc::channel(16);

        Self {
            log: Conversation::new(),
            entries: vec![],
            input,
            scroll: 0,
            busy: false,
            status: "Ready".to_string(),
            theme,
            analyzer,
            model_id,
            cancel: None,
            outcome_tx,
            outcome_rx,
            spinner_start: Instant::now(),
            input_width: 80,
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Clamped against content height during render
        self.scroll = usize::MAX;
    }

    fn push_note(&mut self, text: String, is_error: bool) {
        let entry = if is_error {
            TranscriptEntry::error(text)
        } else {
            TranscriptEntry::info(text)
        };
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    /// Validate and submit the typed path for analysis
    fn submit(&mut self) {
        let path_text = self.input.content().trim().to_string();
        if path_text.is_empty() || self.busy {
            return;
        }

        let Some(format) = ImageFormat::from_path(Path::new(&path_text)) else {
            self.push_note(
                "Unsupported image type. Supported: jpg, jpeg, png, bmp, gif.".to_string(),
                false,
            );
            return;
        };

        let bytes = match fs::read(&path_text) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.push_note(format!("Could not read {}: {}", path_text, e), true);
                return;
            }
        };

        self.input.clear();
        tracing::debug!(path = %path_text, size = bytes.len(), "submitting image for analysis");

        let thumbnail = Thumbnail::from_bytes(&bytes, 40);
        self.log.append_user(&path_text, Some(bytes.clone()));
        self.entries
            .push(TranscriptEntry::user(path_text).with_thumbnail(thumbnail));
        self.scroll_to_bottom();

        self.busy = true;
        self.status = "Analyzing image...".to_string();
        self.spinner_start = Instant::now();

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let analyzer = self.analyzer.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = match analyzer.stage_and_analyze(&bytes, format, &cancel).await {
                Ok(report) => AnalysisOutcome::Report(report),
                Err(e) => AnalysisOutcome::Failed(e.to_string()),
            };
            let _ = tx.send(outcome).await;
        });
    }

    /// Drain outcomes produced by background tasks
    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            match outcome {
                AnalysisOutcome::Report(text) => {
                    self.log.append_assistant(&text);
                    self.entries.push(TranscriptEntry::assistant(text));
                }
                AnalysisOutcome::Failed(message) => {
                    // The user turn is already logged; it still gets answered
                    let text = format!("{} {}", WARNING_PREFIX, message);
                    self.log.append_assistant(&text);
                    self.entries.push(TranscriptEntry::assistant(text));
                }
            }
            self.busy = false;
            self.cancel = None;
            self.status = "Ready".to_string();
            self.scroll_to_bottom();
        }
    }

    /// Handle keyboard action; returns false to quit
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Submit => {
                self.submit();
                true
            }
            Action::Quit | Action::Eof => false,
            Action::Interrupt | Action::Escape => {
                if self.busy {
                    if let Some(cancel) = &self.cancel {
                        cancel.cancel();
                    }
                    self.status = "Cancelling...".to_string();
                    true
                } else {
                    false
                }
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Clear => {
                // Start a fresh session; the old log is dropped wholesale
                self.entries.clear();
                self.log = Conversation::new();
                self.scroll = 0;
                true
            }
            other => {
                self.input.handle_action(&other, self.input_width);
                true
            }
        }
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let title = format!(" medlens │ {} ", self.model_id);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        if self.entries.is_empty() {
            let welcome = Paragraph::new(vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled("  ⚕ ", self.theme.accent_bold()),
                    Span::styled("medlens", self.theme.accent_bold()),
                    Span::styled(" - medical image analysis", self.theme.dim_style()),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    format!("  Model: {}", self.model_id),
                    self.theme.dim_style(),
                )),
                Line::from(""),
                Line::from(""),
                Line::from(Span::styled("  Keybindings", self.theme.warning_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("    Enter     ", self.theme.accent_style()),
                    Span::styled("Analyze image at path", self.theme.base_style()),
                ]),
                Line::from(vec![
                    Span::styled("    Esc       ", self.theme.accent_style()),
                    Span::styled("Cancel analysis / Quit", self.theme.base_style()),
                ]),
                Line::from(vec![
                    Span::styled("    Ctrl+L    ", self.theme.accent_style()),
                    Span::styled("New session", self.theme.base_style()),
                ]),
                Line::from(vec![
                    Span::styled("    PgUp/Dn   ", self.theme.accent_style()),
                    Span::styled("Scroll history", self.theme.base_style()),
                ]),
                Line::from(""),
                Line::from(""),
                Line::from(Span::styled(
                    "  Type the path to an image to get started...",
                    self.theme.dim_style(),
                )),
            ]);
            frame.render_widget(welcome, inner);
            return;
        }

        let content_height = transcript_height(&self.entries, &self.theme, inner.width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let view = TranscriptView::new(&self.entries, &self.theme).scroll(self.scroll);
        frame.render_widget(view, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        if self.busy {
            let spinner =
                Spinner::new(&self.status, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left_content = format!("{} │ {}", self.model_id, self.status);
        let right_content = "Enter: analyze │ Ctrl+L: new session │ Ctrl+C: quit";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(left_content, self.theme.dim_style()))
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

impl AppState for TuiState {
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        self.input_width = size.width;

        // Layout: transcript (flex), status bar (1), input (3)
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_transcript(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input
            .render(chunks[2], frame.buffer_mut(), &self.theme);
    }

    fn tick(&mut self) {
        self.drain_outcomes();
    }
}

/// Run the interactive session
pub async fn run_tui(analyzer: Analyzer, model_id: String, theme: Theme) -> anyhow::Result<()> {
    let mut app = App::new()?;
    let mut state = TuiState::new(analyzer, model_id, theme);

    app.run(&mut state, |state, action| {
        state.drain_outcomes();
        let keep_going = state.handle_action(action);
        async move { keep_going }
    })
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medlens_ai::InlineImage;
    use medlens_pipeline::VisionModel;
    use std::sync::Arc;

    struct FixedReport;

    #[async_trait]
    impl VisionModel for FixedReport {
        async fn generate(&self, _: &str, _: &InlineImage) -> medlens_ai::Result<String> {
            Ok("### 1. Image Type & Region\nTest report.".to_string())
        }
    }

    fn state() -> TuiState {
        TuiState::new(
            Analyzer::new(Arc::new(FixedReport)),
            "gemini-2.0-flash-exp".to_string(),
            Theme::dark(),
        )
    }

    #[tokio::test]
    async fn test_submit_with_missing_file_notes_error() {
        let mut state = state();
        for c in "/no/such/file.png".chars() {
            state.handle_action(Action::Char(c));
        }
        assert!(state.handle_action(Action::Submit));
        assert_eq!(state.entries.len(), 1);
        assert!(!state.busy);
        // Input is preserved so the path can be corrected
        assert!(!state.input.is_empty());
    }

    #[tokio::test]
    async fn test_submit_unsupported_extension_notes_without_reading() {
        let mut state = state();
        for c in "/tmp/report.pdf".chars() {
            state.handle_action(Action::Char(c));
        }
        state.handle_action(Action::Submit);
        assert_eq!(state.entries.len(), 1);
        assert!(state.log.is_empty());
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_escape_quits_when_idle() {
        let mut state = state();
        assert!(!state.handle_action(Action::Escape));
    }

    #[tokio::test]
    async fn test_clear_starts_fresh_session() {
        let mut state = state();
        state.push_note("note".to_string(), false);
        state.log.append_user("x", None);
        state.handle_action(Action::Clear);
        assert!(state.entries.is_empty());
        assert!(state.log.is_empty());
    }

    #[tokio::test]
    async fn test_staging_failure_still_answers_user_turn() {
        let mut state = state();
        state.log.append_user("/scans/chest.png", Some(vec![1, 2, 3]));
        state
            .entries
            .push(TranscriptEntry::user("/scans/chest.png"));
        state.busy = true;

        state
            .outcome_tx
            .try_send(AnalysisOutcome::Failed("I/O error: disk full".to_string()))
            .unwrap();
        state.drain_outcomes();

        let roles: Vec<_> = state.log.turns().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                medlens_pipeline::Role::User,
                medlens_pipeline::Role::Assistant
            ]
        );
        let answer = state.log.last().unwrap();
        assert!(answer.text.starts_with(WARNING_PREFIX));
        assert!(answer.text.contains("disk full"));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_empty_submit_is_noop() {
        let mut state = state();
        assert!(state.handle_action(Action::Submit));
        assert!(state.entries.is_empty());
        assert!(!state.busy);
    }
}
