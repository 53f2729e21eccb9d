use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

/// TUI-specific events (keyboard, paste, resize, redraw ticks)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(KeyEvent),

    /// Bracketed paste
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// No input within the tick rate; used to animate the spinner
    Tick,
}

/// Reads terminal events on a background thread and forwards them to the
/// async event loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TuiEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || loop {
            let next = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
                    Ok(Event::Paste(text)) => TuiEvent::Paste(text),
                    Ok(Event::Resize(w, h)) => TuiEvent::Resize(w, h),
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to read terminal event");
                        break;
                    }
                },
                Ok(false) => TuiEvent::Tick,
                Err(err) => {
                    tracing::error!(error = %err, "failed to poll terminal events");
                    break;
                }
            };

            if tx.send(next).is_err() {
                break;
            }
        });

        Self { rx }
    }

    /// Next terminal event; `None` once the reader thread has stopped.
    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.rx.recv().await
    }
}
