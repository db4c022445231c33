pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{EventStream, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::gateway::TodoGateway;
use crate::manager::TaskManager;
use crate::storage::SessionFile;
use app::{App, AppEvent};
use ui::ui;

/// Runs the interactive UI. Must be awaited inside a `tokio::task::LocalSet`.
pub async fn run_tui<G: TodoGateway + 'static>(
    manager: TaskManager<G>,
    session_file: Option<SessionFile>,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, events) = App::new(manager, session_file);
    app.start();
    info!("tui started");

    let res = run_app(&mut terminal, &mut app, events).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "tui exited with error");
    }
    res
}

async fn run_app<B: Backend, G: TodoGateway + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<G>,
    mut events: UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    let mut keys = EventStream::new();
    // Redraws the loading state while requests are pending.
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    loop {
        app.sync_selection();
        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            maybe_event = keys.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(event) = events.recv() => app.apply(event),
            _ = tick.tick() => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
