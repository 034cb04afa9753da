use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::controller::{DashboardController, UNEXPECTED_ERROR};
use crate::models::Config;
use crate::ui::{
    events::{is_quit, EventSource, TuiEvent},
    layout::{Tab, TuiLayout},
    notification::Severity,
    View,
};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main TUI application
pub struct StockTuiApp {
    pub should_quit: bool,
    pub controller: DashboardController,
}

impl StockTuiApp {
    pub fn new(controller: DashboardController) -> Self {
        Self {
            should_quit: false,
            controller,
        }
    }

    fn active_view(&self) -> &dyn View {
        match self.controller.active_tab() {
            Tab::Dashboard => &self.controller.dashboard,
            Tab::Analysis => &self.controller.analysis,
            Tab::Watchlist => &self.controller.watchlist,
            Tab::Reports => &self.controller.reports,
            Tab::System => &self.controller.system,
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        let layout = TuiLayout::new(area);
        layout.render_tab_bar(f, self.controller.active_tab());

        let view = self.active_view();
        view.render(f, layout.content);
        let status = view.get_status();
        layout.render_status_bar(f, self.controller.is_online(), &status);

        self.controller.notifier().render(f, area);
        self.controller.modal_mut().render(f, area);
    }

    /// Route one event; handler errors are reported instead of ending the loop
    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => {
                if let Err(e) = self.handle_key(key) {
                    error!("Key handler failed: {:#}", e);
                    self.controller.notify(UNEXPECTED_ERROR, Severity::Error);
                }
            }
            TuiEvent::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    self.controller.click(mouse.column, mouse.row);
                }
            }
            TuiEvent::Resize(..) => {}
            TuiEvent::Tick => self.controller.tick(Instant::now()),
            TuiEvent::Refresh => self.controller.on_refresh_tick(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let editing = self.active_view().is_editing();
        if is_quit(&key, editing) {
            self.should_quit = true;
            return Ok(());
        }

        if self.controller.modal().is_visible() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') => self.controller.confirm_modal(),
                KeyCode::Esc | KeyCode::Char('n') => self.controller.dismiss_modal(),
                _ => {}
            }
            return Ok(());
        }

        if editing {
            self.handle_input_key(key.code);
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => self.controller.switch_tab(self.controller.active_tab().next()),
            KeyCode::BackTab => self.controller.switch_tab(self.controller.active_tab().previous()),
            KeyCode::Char('x') => self.controller.close_notification(),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(tab) = Tab::from_digit(c) {
                    self.controller.switch_tab(tab);
                }
            }
            code => self.handle_tab_key(code)?,
        }
        Ok(())
    }

    fn handle_tab_key(&mut self, code: KeyCode) -> Result<()> {
        let controller = &mut self.controller;
        match (controller.active_tab(), code) {
            (Tab::Dashboard, KeyCode::Char('r')) => {
                controller.refresh_dashboard();
                controller.dashboard.touch();
            }

            (Tab::Analysis, KeyCode::Char('/')) => controller.analysis.editing = true,
            (Tab::Analysis, KeyCode::Char('a')) => controller.add_to_watchlist(),
            (Tab::Analysis, KeyCode::Char('o')) => controller.open_full_report()?,
            (Tab::Analysis, KeyCode::Char('p')) => controller.download_report(),

            (Tab::Watchlist, KeyCode::Up) => controller.watchlist.select_previous(),
            (Tab::Watchlist, KeyCode::Down) => controller.watchlist.select_next(),
            (Tab::Watchlist, KeyCode::Char('d')) => controller.request_remove(),
            (Tab::Watchlist, KeyCode::Char('b')) => controller.batch_analyze(),
            (Tab::Watchlist, KeyCode::Char('r')) => controller.render_watchlist(),

            (Tab::Reports, KeyCode::Char('/')) => controller.reports.editing = true,
            (Tab::Reports, KeyCode::Up) => controller.reports.scroll_up(),
            (Tab::Reports, KeyCode::Down) => controller.reports.scroll_down(),

            (Tab::System, KeyCode::Char('r')) => controller.load_system(),
            (Tab::System, KeyCode::Char('c')) => controller.request_clear_cache(),
            (Tab::System, KeyCode::Char('i')) => controller.invalidate_cache(),
            (Tab::System, KeyCode::Char('t')) => controller.toggle_source(),
            (Tab::System, KeyCode::Up) => controller.system.select_previous(),
            (Tab::System, KeyCode::Down) => controller.system.select_next(),

            _ => {}
        }
        Ok(())
    }

    /// Keys while a symbol input has focus
    fn handle_input_key(&mut self, code: KeyCode) {
        let controller = &mut self.controller;
        let tab = controller.active_tab();
        let (input, editing) = match tab {
            Tab::Analysis => (&mut controller.analysis.search_input, &mut controller.analysis.editing),
            Tab::Reports => (&mut controller.reports.symbol_input, &mut controller.reports.editing),
            _ => return,
        };

        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => *editing = false,
            KeyCode::Enter => {
                *editing = false;
                let raw = input.clone();
                match tab {
                    Tab::Analysis => controller.analyze(&raw),
                    _ => controller.render_report_inline(&raw),
                }
            }
            _ => {}
        }
    }
}

/// Run the interactive dashboard until the user quits
pub async fn run_app_async(config: &Config) -> Result<()> {
    let mut app = StockTuiApp::new(DashboardController::from_config(config)?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app, config).await;

    // restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut StockTuiApp,
    config: &Config,
) -> Result<()> {
    let refresh_every = Duration::from_secs(config.refresh_interval_secs.max(1));
    let mut events = EventSource::new(TICK_RATE, refresh_every);

    info!("Dashboard started, refreshing every {:?}", refresh_every);
    app.controller.bootstrap();

    while !app.should_quit {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => app.handle_event(event),
                None => break,
            },
            Some(update) = app.controller.next_update() => app.controller.apply_update(update),
        }
    }

    info!("Dashboard closed");
    Ok(())
}
