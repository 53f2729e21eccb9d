use crate::ui::chat::commands::{command_entries, parse_slash_command, CommandEntry, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use unicode_width::UnicodeWidthChar;

const PLACEHOLDER: &str = "Type your message...";

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerAction {
    /// Enter pressed on regular text
    Submit,
    /// Enter pressed on a recognised slash command. The draft is cleared.
    Command(SlashCommand),
    None,
}

/// Single-line input. The text itself lives in the session draft; the
/// composer only tracks the cursor and the command palette.
#[derive(Debug, Clone)]
pub struct Composer {
    /// Cursor position in chars
    cursor: usize,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn palette_open(&self) -> bool {
        self.show_command_palette
    }

    /// Handle a key press against the draft text
    pub fn handle_key(&mut self, key: KeyEvent, draft: &mut String) -> ComposerAction {
        if key.kind != KeyEventKind::Press {
            return ComposerAction::None;
        }
        // The draft may have been cleared by a send since the last key.
        self.cursor = self.cursor.min(draft.chars().count());

        match key.code {
            KeyCode::Enter => {
                if self.show_command_palette {
                    self.apply_selected_command(draft);
                }
                self.close_command_palette();

                if let Some(command) = parse_slash_command(draft) {
                    draft.clear();
                    self.cursor = 0;
                    return ComposerAction::Command(command);
                }
                if !draft.trim().is_empty() {
                    return ComposerAction::Submit;
                }
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command(draft);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(draft, c);
                self.sync_command_palette(draft);
            }
            KeyCode::Backspace => {
                if self.backspace(draft) {
                    self.sync_command_palette(draft);
                }
            }
            KeyCode::Delete => {
                if self.delete(draft) {
                    self.sync_command_palette(draft);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(draft.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = draft.chars().count(),
            _ => {}
        }

        ComposerAction::None
    }

    /// Insert pasted text at the cursor. Line breaks become spaces since the
    /// input is a single line.
    pub fn paste(&mut self, text: &str, draft: &mut String) {
        self.cursor = self.cursor.min(draft.chars().count());
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(draft, if c == '\n' { ' ' } else { c });
        }
        self.sync_command_palette(draft);
    }

    /// Reset after the draft was replaced or cleared elsewhere
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.close_command_palette();
    }

    fn insert_char(&mut self, draft: &mut String, c: char) {
        let at = byte_index(draft, self.cursor);
        draft.insert(at, c);
        self.cursor += 1;
    }

    fn backspace(&mut self, draft: &mut String) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = byte_index(draft, self.cursor);
        draft.remove(at);
        true
    }

    fn delete(&mut self, draft: &mut String) -> bool {
        if self.cursor >= draft.chars().count() {
            return false;
        }
        let at = byte_index(draft, self.cursor);
        draft.remove(at);
        true
    }

    fn sync_command_palette(&mut self, draft: &str) {
        let is_command_prefix = draft.starts_with('/') && !draft.contains(char::is_whitespace);
        if !is_command_prefix {
            self.close_command_palette();
            return;
        }

        if !self.show_command_palette {
            self.show_command_palette = true;
            self.selected_command = Some(0);
        }
        self.refresh_command_palette(draft);
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self, draft: &str) {
        let query = draft.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self, draft: &mut String) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index).copied())
        else {
            return false;
        };

        *draft = format!("/{}", entry.keyword);
        self.cursor = draft.chars().count();
        self.close_command_palette();
        true
    }
}

fn byte_index(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

// Drop leading chars until everything up to `cursor_end` fits in `width`
// columns.
fn scroll_to_cursor(content: &str, cursor_end: usize, width: usize) -> &str {
    if width == 0 {
        return content;
    }
    let mut shown = content
        .chars()
        .take(cursor_end)
        .map(|c| c.width().unwrap_or(0))
        .sum::<usize>();
    let mut start = 0;
    for c in content.chars().take(cursor_end) {
        if shown <= width {
            break;
        }
        shown -= c.width().unwrap_or(0);
        start += c.len_utf8();
    }
    &content[start..]
}

/// Render-time view of the composer and the session flags it reflects
pub struct ComposerView<'a> {
    pub composer: &'a Composer,
    pub draft: &'a str,
    pub is_awaiting: bool,
    pub is_recording: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let enabled = !self.is_awaiting;

        let (mic_label, mic_style) = if self.is_recording {
            ("🔴 mic on", Style::default().fg(Color::White).bg(Color::Red))
        } else {
            ("🎙 mic off", Style::default().fg(Color::Gray))
        };
        let send_style = if enabled && !self.draft.trim().is_empty() {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(vec![Span::styled(format!(" {mic_label} "), mic_style)]))
            .title(
                ratatui::widgets::block::Title::from(Span::styled(" ⏎ Send ", send_style))
                    .alignment(ratatui::layout::Alignment::Right),
            )
            .border_style(if enabled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            });

        let inner = block.inner(area);
        block.render(area, buf);

        if self.draft.is_empty() {
            let placeholder = Line::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)));
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
        } else {
            let text_style = if enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let cursor = self.composer.cursor.min(self.draft.chars().count());
            let mut content: String = self.draft.to_string();
            if enabled {
                content.insert(byte_index(&content, cursor), '▌');
            }
            let visible = scroll_to_cursor(&content, cursor + usize::from(enabled), inner.width as usize);
            buf.set_line(inner.x, inner.y, &Line::from(Span::styled(visible, text_style)), inner.width);
        }

        if self.composer.show_command_palette {
            render_palette(self.composer, area, buf);
        }
    }
}

fn render_palette(composer: &Composer, anchor: Rect, buf: &mut Buffer) {
    let filtered = &composer.filtered_commands;
    let height = (filtered.len().min(5) + 2) as u16;
    if anchor.y < height {
        return;
    }
    let area = Rect {
        x: anchor.x,
        y: anchor.y - height,
        width: anchor.width,
        height,
    };

    Clear.render(area, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Commands")
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    block.render(area, buf);

    for (index, entry) in filtered.iter().enumerate().take(inner.height as usize) {
        let style = if composer.selected_command == Some(index) {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let line = Line::from(vec![
            Span::styled(format!("/{}", entry.keyword), style),
            Span::styled("  ", Style::default()),
            Span::styled(entry.description, Style::default().fg(Color::Gray)),
        ]);
        buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
    }
}
