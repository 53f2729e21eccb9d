pub mod chat;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use chat::{get_help_text, ComposerView, HistoryView};

pub const TITLE: &str = "Financial Analysis Assistant";

/// Draw the whole screen from application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // History
            Constraint::Length(3), // Composer
        ])
        .split(frame.size());

    render_header(frame, app, chunks[0]);

    let session = app.session();
    frame.render_widget(
        HistoryView {
            history: app.history(),
            messages: session.conversation().messages(),
            is_awaiting: session.is_awaiting(),
            ui: app.ui_config(),
            tick: app.tick(),
        },
        chunks[1],
    );

    frame.render_widget(
        ComposerView {
            composer: app.composer(),
            draft: session.draft(),
            is_awaiting: session.is_awaiting(),
            is_recording: session.is_recording(),
        },
        chunks[2],
    );

    if app.show_help() {
        let area = frame.size();
        render_help(frame, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Line::from(vec![
        Span::styled("🧠 ", Style::default().fg(Color::Blue)),
        Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(title), area);

    let backend = Line::from(Span::styled(
        app.backend_label().to_string(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(backend).alignment(Alignment::Right), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = area.width.min(72);
    let height = area.height.min(14);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(get_help_text())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help (any key to close) ")
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
        popup,
    );
}
