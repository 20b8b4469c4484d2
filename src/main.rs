mod app;
mod logging;
mod settings;
mod speedtest;
mod ui;

use anyhow::Result;
use app::{poll_event, App, AppAction};
use clap::Parser;
use crossterm::event::Event;
use ratatui::DefaultTerminal;
use settings::Settings;
use speedtest::sequencer::SequenceEvent;
use speedtest::TestPhase;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use ui::draw_ui;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    if let Some(path) = &settings.log_file {
        logging::init_logging(path)?;
    }
    info!(mode = %settings.mode, seed = ?settings.seed, "starting");

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, &settings).await;

    ratatui::restore();
    result
}

async fn run_app(terminal: &mut DefaultTerminal, settings: &Settings) -> Result<()> {
    let mut app = App::new(settings);
    let mut test_rx: Option<mpsc::Receiver<SequenceEvent>> = None;

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Drain sequence events
        if let Some(rx) = test_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(event) => app.apply_event(event),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        if app.phase != TestPhase::Complete {
                            warn!(state = ?app.sequencer.state(), "sequence ended without completing");
                            app.complete_test();
                        }
                        test_rx = None;
                        break;
                    }
                }
            }
        }

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            if let Some(action) = app.handle_key_event(key) {
                match action {
                    AppAction::Quit => break,
                    AppAction::StartTest => {
                        let (tx, rx) = mpsc::channel(32);
                        if app.start_test(tx).is_some() {
                            test_rx = Some(rx);
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
