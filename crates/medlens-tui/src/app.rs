//! Application runner: terminal setup, event loop, teardown

use crate::input::{Action, event_to_action};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;

/// Application state trait
pub trait AppState {
    /// Render the UI
    fn render(&mut self, frame: &mut ratatui::Frame);

    /// Called on each tick (for animations and pending events)
    fn tick(&mut self) {}
}

/// Main application runner
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
}

impl App {
    /// Create a new application, entering the alternate screen
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            tick_rate: Duration::from_millis(80),
        })
    }

    /// Set the tick rate for animations
    pub fn with_tick_rate(mut self, rate: Duration) -> Self {
        self.tick_rate = rate;
        self
    }

    /// Run the event loop. The handler returns false to quit.
    pub async fn run<S, F, Fut>(&mut self, state: &mut S, mut handler: F) -> io::Result<()>
    where
        S: AppState,
        F: FnMut(&mut S, Action) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        use crossterm::event::EventStream;
        use futures::StreamExt;

        let mut event_stream = EventStream::new();

        loop {
            self.terminal.draw(|frame| {
                state.render(frame);
            })?;

            // Wait for input, ticking on timeout so spinners animate and
            // pending background events get drained.
            match tokio::time::timeout(self.tick_rate, event_stream.next()).await {
                Ok(Some(Ok(evt))) => {
                    if let Some(action) = event_to_action(evt) {
                        if !handler(state, action).await {
                            return Ok(());
                        }
                    }
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => return Ok(()),
                Err(_) => state.tick(),
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}
