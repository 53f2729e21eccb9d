use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub const PROCESSING_TEXT: &str = "Processing your request...";

/// Left-aligned "processing" bubble shown while a send is awaiting.
pub fn processing_line(tick: u64) -> Line<'static> {
    let frame = SPINNER[(tick as usize) % SPINNER.len()];
    let style = Style::default().fg(Color::Black).bg(Color::Rgb(243, 244, 246));

    Line::from(vec![
        Span::styled(format!(" {frame} "), style.fg(Color::Blue)),
        Span::styled(format!("{PROCESSING_TEXT} "), style),
    ])
}
