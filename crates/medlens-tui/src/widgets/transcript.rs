//! Scrollable transcript of the analysis session
//!
//! Each entry is one turn: the user's submitted image (thumbnail plus the
//! path they typed), the model's report, or an informational note from the
//! app itself. Entries build their display lines on demand so the scroll
//! math and the rendering can never disagree.

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use crate::widgets::thumbnail::Thumbnail;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// What kind of turn an entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Info,
}

/// A single transcript entry
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    kind: EntryKind,
    text: String,
    thumbnail: Option<Thumbnail>,
    is_error: bool,
}

impl TranscriptEntry {
    /// A user turn showing the submitted image path
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::User,
            text: text.into(),
            thumbnail: None,
            is_error: false,
        }
    }

    /// A model report turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Assistant,
            text: text.into(),
            thumbnail: None,
            is_error: false,
        }
    }

    /// An informational note from the app itself
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Info,
            text: text.into(),
            thumbnail: None,
            is_error: false,
        }
    }

    /// An error note from the app itself
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Info,
            text: text.into(),
            thumbnail: None,
            is_error: true,
        }
    }

    /// Attach an image preview to the entry
    pub fn with_thumbnail(mut self, thumbnail: Option<Thumbnail>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Build the display lines for this entry at the given width
    fn lines(&self, theme: &Theme, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (label, style, prefix) = match self.kind {
            EntryKind::User => ("You", theme.accent_bold(), "▶ "),
            EntryKind::Assistant => (
                "Analysis",
                theme.success_style().add_modifier(Modifier::BOLD),
                "◀ ",
            ),
            EntryKind::Info => ("Note", theme.dim_style(), "● "),
        };
        lines.push(Line::from(Span::styled(format!("{prefix}{label}"), style)));

        if let Some(thumb) = &self.thumbnail {
            for row in thumb.lines() {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(row.spans.iter().cloned());
                lines.push(Line::from(spans));
            }
        }

        let content_width = width.saturating_sub(2);
        if self.kind == EntryKind::Assistant && !self.is_error {
            for line in render_markdown(&self.text, theme, content_width) {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
        } else {
            let style = if self.is_error {
                theme.error_style()
            } else if self.kind == EntryKind::Info {
                theme.dim_style()
            } else {
                theme.base_style()
            };
            for line in textwrap::wrap(&self.text, content_width.max(1)) {
                lines.push(Line::from(Span::styled(format!("  {line}"), style)));
            }
        }

        lines.push(Line::from(""));
        lines
    }
}

/// Widget displaying the session transcript
pub struct TranscriptView<'a> {
    entries: &'a [TranscriptEntry],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> TranscriptView<'a> {
    pub fn new(entries: &'a [TranscriptEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            theme,
            scroll: 0,
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let mut all_lines: Vec<Line> = Vec::new();
        for entry in self.entries {
            all_lines.extend(entry.lines(self.theme, width));
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total line height of the transcript at the given width.
/// Used by the app to clamp scrolling and keep the tail in view.
pub fn transcript_height(entries: &[TranscriptEntry], theme: &Theme, width: usize) -> usize {
    entries
        .iter()
        .map(|entry| entry.lines(theme, width).len())
        .sum()
}
