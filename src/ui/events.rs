use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::warn;

/// Unified TUI events
#[derive(Debug, Clone)]
pub enum TuiEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Redraw and housekeeping
    Tick,
    /// Dashboard auto-refresh timer
    Refresh,
}

/// Merges terminal input with the UI tick and the refresh timer
pub struct EventSource {
    terminal: EventStream,
    tick: Interval,
    refresh: Interval,
}

impl EventSource {
    pub fn new(tick_rate: Duration, refresh_every: Duration) -> Self {
        let mut tick = interval(tick_rate);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // the first refresh comes one full period after start-up
        let mut refresh = tokio::time::interval_at(tokio::time::Instant::now() + refresh_every, refresh_every);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            terminal: EventStream::new(),
            tick,
            refresh,
        }
    }

    /// Wait for the next event; `None` once the terminal stream ends
    pub async fn next(&mut self) -> Option<TuiEvent> {
        loop {
            tokio::select! {
                event = self.terminal.next() => match event {
                    Some(Ok(event)) => {
                        if let Some(event) = Self::translate(event) {
                            return Some(event);
                        }
                    }
                    Some(Err(e)) => warn!("Terminal event error: {}", e),
                    None => return None,
                },
                _ = self.tick.tick() => return Some(TuiEvent::Tick),
                _ = self.refresh.tick() => return Some(TuiEvent::Refresh),
            }
        }
    }

    fn translate(event: Event) -> Option<TuiEvent> {
        match event {
            // key releases arrive on Windows only
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
            Event::Mouse(mouse) => Some(TuiEvent::Mouse(mouse)),
            Event::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
            _ => None,
        }
    }
}

/// `q` outside text input, or Ctrl-C anywhere
pub fn is_quit(key: &KeyEvent, editing: bool) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
        KeyCode::Char('q') | KeyCode::Char('Q') => !editing,
        _ => false,
    }
}
