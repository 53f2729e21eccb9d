//! Terminal application: owns the session and runs the event loop.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::api::BackendClient;
use crate::config::{Config, UiConfig};
use crate::driver::DriverEvent;
use crate::events::{EventHandler, TuiEvent};
use crate::session::ChatSession;
use crate::ui;
use crate::ui::chat::{ChatHistory, Composer, ComposerAction, SlashCommand};

const TICK_RATE: Duration = Duration::from_millis(100);
const SCROLL_STEP: usize = 5;

pub struct App {
    session: ChatSession,
    composer: Composer,
    history: ChatHistory,
    ui: UiConfig,
    backend_label: String,
    show_help: bool,
    should_quit: bool,
    tick: u64,
}

impl App {
    pub fn new(session: ChatSession, ui: UiConfig, backend_label: impl Into<String>) -> Self {
        Self {
            session,
            composer: Composer::new(),
            history: ChatHistory::new(),
            ui,
            backend_label: backend_label.into(),
            show_help: false,
            should_quit: false,
            tick: 0,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn ui_config(&self) -> &UiConfig {
        &self.ui
    }

    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(text) => {
                if !self.session.is_awaiting() {
                    self.composer.paste(&text, self.session.draft_mut());
                }
            }
            TuiEvent::Resize(..) => {}
            TuiEvent::Tick => self.tick = self.tick.wrapping_add(1),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.session.toggle_recording();
                return;
            }
            KeyCode::PageUp => {
                self.history.scroll_up(SCROLL_STEP);
                return;
            }
            KeyCode::PageDown => {
                self.history.scroll_down(SCROLL_STEP);
                return;
            }
            KeyCode::End if ctrl => {
                self.history.scroll_to_latest();
                return;
            }
            _ => {}
        }

        // The input is disabled while a send is awaiting its response.
        if self.session.is_awaiting() {
            return;
        }

        match self.composer.handle_key(key, self.session.draft_mut()) {
            ComposerAction::Submit => {
                if self.session.send_draft() {
                    self.composer.reset();
                }
            }
            ComposerAction::Command(command) => self.run_command(command),
            ComposerAction::None => {}
        }
    }

    fn run_command(&mut self, command: SlashCommand) {
        tracing::debug!(command = command.command(), "slash command");
        match command {
            SlashCommand::Mic => {
                self.session.toggle_recording();
            }
            SlashCommand::Help => self.show_help = true,
            SlashCommand::Quit => self.should_quit = true,
        }
    }

    pub fn on_driver_event(&mut self, event: DriverEvent) {
        self.session.apply(event);
    }

    /// Keep the history pinned to the newest message after appends.
    pub fn prepare_for_render(&mut self) {
        self.history.sync(self.session.conversation().len());
    }
}

/// Restores the terminal when dropped, including on early return or panic.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .context("Failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the chat TUI until the user quits.
pub async fn run(config: Config) -> Result<()> {
    let client = BackendClient::from_config(&config).context("Failed to create backend client")?;
    tracing::info!(base_url = %config.base_url, "starting chat client");

    let session = ChatSession::new(Arc::new(client), config.poll_interval());
    let mut app = App::new(session, config.ui.clone(), config.base_url.clone());

    let mut guard = TerminalGuard::enter()?;
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit() {
        app.prepare_for_render();
        guard.terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            biased;

            Some(event) = app.session.next_driver_event() => {
                app.on_driver_event(event);
            }
            maybe_event = events.next() => match maybe_event {
                Some(event) => app.handle_event(event),
                None => break,
            },
        }
    }

    tracing::info!(messages = app.session().conversation().len(), "chat client closed");
    Ok(())
}
