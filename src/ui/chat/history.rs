//! Chat history rendered as left/right aligned bubbles

use crate::config::UiConfig;
use crate::conversation::{Message, MessageKind};
use crate::ui::chat::indicator::processing_line;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};
use std::cell::Cell;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TAB: &str = "    ";

/// Scroll position of the history. Offset counts lines up from the bottom,
/// so zero means the newest message is in view.
#[derive(Debug, Default)]
pub struct ChatHistory {
    offset: usize,
    seen_len: usize,
    max_offset: Cell<usize>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to the newest message whenever the conversation grew.
    pub fn sync(&mut self, message_count: usize) {
        if message_count != self.seen_len {
            self.seen_len = message_count;
            self.scroll_to_latest();
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_to_latest(&mut self) {
        self.offset = 0;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Render-time view over the conversation
pub struct HistoryView<'a> {
    pub history: &'a ChatHistory,
    pub messages: &'a [Message],
    pub is_awaiting: bool,
    pub ui: &'a UiConfig,
    pub tick: u64,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.is_awaiting {
            render_welcome(inner, buf);
            return;
        }

        let bubble_width = bubble_width(inner.width, self.ui.bubble_width_percent);
        let mut lines: Vec<Line<'static>> = Vec::new();
        for message in self.messages {
            lines.extend(message_lines(message, bubble_width, self.ui.show_timestamps));
            lines.push(Line::default());
        }
        if self.is_awaiting {
            lines.push(processing_line(self.tick));
        }

        let height = inner.height as usize;
        let max_offset = lines.len().saturating_sub(height);
        self.history.max_offset.set(max_offset);
        let offset = self.history.offset.min(max_offset);
        let top = max_offset - offset;

        Paragraph::new(Text::from(lines))
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(inner, buf);

        if max_offset > 0 {
            let mut state = ScrollbarState::new(max_offset).position(top);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None)
                .render(inner, buf, &mut state);
        }
    }
}

fn render_welcome(area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "Ask about a company, a filing, or a market move.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Enter to send, /help for commands",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn bubble_width(area_width: u16, percent: u16) -> usize {
    let percent = percent.clamp(20, 100) as usize;
    (area_width as usize * percent / 100).max(12)
}

fn bubble_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::User => Style::default().fg(Color::White).bg(Color::Rgb(59, 130, 246)),
        MessageKind::Agent => Style::default().fg(Color::Black).bg(Color::Rgb(243, 244, 246)),
        MessageKind::Error => Style::default().fg(Color::Rgb(185, 28, 28)).bg(Color::Rgb(254, 226, 226)),
    }
}

/// Lines for one bubble: optional author, wrapped text, optional timestamp.
pub fn message_lines(message: &Message, max_width: usize, show_timestamp: bool) -> Vec<Line<'static>> {
    let style = bubble_style(message.kind());
    let alignment = match message.kind() {
        MessageKind::User => Alignment::Right,
        MessageKind::Agent | MessageKind::Error => Alignment::Left,
    };

    // One column of padding on each side inside the bubble.
    let text_width = max_width.saturating_sub(2).max(1);
    let body = wrap_text(message.text(), text_width);
    let timestamp = message.timestamp_label();
    let inner_width = body
        .iter()
        .map(|line| line.width())
        .chain(show_timestamp.then(|| timestamp.width()))
        .max()
        .unwrap_or(0);

    let pad = |text: &str| {
        let fill = inner_width.saturating_sub(text.width());
        format!(" {text}{} ", " ".repeat(fill))
    };
    let mut lines = Vec::new();

    if let (MessageKind::Agent, Some(author)) = (message.kind(), message.author()) {
        lines.push(
            Line::from(Span::styled(author.to_string(), Style::default().fg(Color::Gray)))
                .alignment(alignment),
        );
    }

    for text in &body {
        lines.push(Line::from(Span::styled(pad(text), style)).alignment(alignment));
    }

    if show_timestamp {
        lines.push(
            Line::from(Span::styled(pad(&timestamp), style.add_modifier(Modifier::DIM)))
                .alignment(alignment),
        );
    }

    lines
}

/// Word-wrap by display width. Explicit newlines, indentation and runs of
/// spaces are kept; whitespace at a wrap point is dropped. Words wider than
/// the line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r').replace('\t', TAB);
        let mut current = String::new();
        let mut current_width = 0;

        for token in tokens(&paragraph) {
            let token_width = token.width();

            if token.starts_with(char::is_whitespace) {
                if current_width + token_width > width {
                    if current_width > 0 {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0;
                    }
                    continue;
                }
                current.push_str(token);
                current_width += token_width;
                continue;
            }

            if current_width + token_width > width && current_width > 0 {
                lines.push(std::mem::take(&mut current).trim_end().to_string());
                current_width = 0;
            }
            for c in token.chars() {
                let char_width = c.width().unwrap_or(0);
                if current_width + char_width > width && current_width > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(c);
                current_width += char_width;
            }
        }

        lines.push(current);
    }

    lines
}

// Alternating runs of whitespace and non-whitespace.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = first.is_whitespace();
        let end = rest
            .find(|c: char| c.is_whitespace() != space)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}
