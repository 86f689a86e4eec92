//! Markdown rendering for report text
//!
//! Reports come back from the model as markdown (headings, lists, emphasis,
//! occasional code). Rendering maps that onto styled ratatui lines; anything
//! the model emits that we don't style still comes through as plain text.

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Convert markdown text to styled ratatui lines
pub fn render_markdown<'a>(text: &str, theme: &Theme, width: usize) -> Vec<Line<'a>> {
    let mut renderer = Renderer::new(theme, width);
    for event in Parser::new(text) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer<'t, 'a> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'a>>,
    current: Vec<Span<'a>>,
    style: Style,
    list_depth: usize,
    code_block: Option<String>,
}

impl<'t, 'a> Renderer<'t, 'a> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            current: Vec::new(),
            style: theme.base_style(),
            list_depth: 0,
            code_block: None,
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        self.lines.push(Line::from(""));
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self
                .theme
                .accent_style()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            HeadingLevel::H2 | HeadingLevel::H3 => {
                self.theme.accent_style().add_modifier(Modifier::BOLD)
            }
            _ => self.theme.accent_style(),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if let Some(ref mut block) = self.code_block {
                    block.push_str(&text);
                } else {
                    self.current.push(Span::styled(text.to_string(), self.style));
                }
            }
            Event::Code(code) => {
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.current.push(Span::styled(format!("`{code}`"), style));
            }
            Event::SoftBreak => self.current.push(Span::raw(" ")),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                let rule = "─".repeat(self.width.min(40));
                self.lines.push(Line::from(Span::styled(rule, self.theme.dim_style())));
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.style = self.heading_style(level);
            }
            Tag::Paragraph => self.flush(),
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::List(_) => self.list_depth += 1,
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.current
                    .push(Span::styled(format!("{indent}• "), self.theme.dim_style()));
            }
            Tag::Emphasis => self.style = self.style.add_modifier(Modifier::ITALIC),
            Tag::Strong => self.style = self.style.add_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.style = self.style.add_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } => self.style = Style::default().fg(self.theme.link),
            Tag::BlockQuote(_) => {
                self.flush();
                self.style = self.theme.dim_style().add_modifier(Modifier::ITALIC);
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush();
                self.style = self.theme.base_style();
            }
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::CodeBlock => {
                if let Some(block) = self.code_block.take() {
                    let style = self.theme.code_style().add_modifier(Modifier::DIM);
                    let max = self.width.saturating_sub(4);
                    for code_line in block.lines() {
                        let shown: String = code_line.chars().take(max).collect();
                        self.lines
                            .push(Line::from(Span::styled(format!("  {shown}"), style)));
                    }
                    self.blank();
                }
            }
            TagEnd::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.style = self.theme.base_style();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.style = self.theme.base_style();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'a>> {
        self.flush();
        // Drop trailing blank lines
        while self
            .lines
            .last()
            .is_some_and(|l| l.spans.iter().all(|s| s.content.is_empty()))
        {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paragraph() {
        let theme = Theme::dark();
        let lines = render_markdown("Hello, world!", &theme, 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].content, "Hello, world!");
    }

    #[test]
    fn test_report_headings_and_lists() {
        let theme = Theme::dark();
        let md = "### 1. Image Type & Region\n- X-ray, chest\n- PA view\n";
        let lines = render_markdown(md, &theme, 80);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text[0].contains("1. Image Type & Region"));
        assert!(text.iter().any(|l| l.contains("• X-ray, chest")));
    }

    #[test]
    fn test_code_block_preserved() {
        let theme = Theme::dark();
        let lines = render_markdown("```\nHU: -950\n```", &theme, 80);
        assert!(
            lines
                .iter()
                .any(|l| l.spans.iter().any(|s| s.content.contains("HU: -950")))
        );
    }

    #[test]
    fn test_no_trailing_blank_lines() {
        let theme = Theme::dark();
        let lines = render_markdown("one paragraph\n\n", &theme, 80);
        assert!(!lines.last().unwrap().spans.iter().all(|s| s.content.is_empty()));
    }
}
