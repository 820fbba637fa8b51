//! JOBWIZARD - Terminal Job Application Wizard
//!
//! Walks an applicant through the job application one step at a time,
//! saving the draft on every change and submitting the finished form.

use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use jobwizard::application::{App, AppMode, Wizard};
use jobwizard::infrastructure::{init_logging, Config, FileSlot};
use jobwizard::presentation::{render_ui, InputHandler};

/// Entry point for the job application wizard.
///
/// Reads the configuration, opens the saved draft, sets up the terminal
/// interface and runs the main event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the log file, the submission client or the
/// terminal cannot be set up.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(&config.log_file)?;

    let boundary = config.boundary()?;
    let wizard = Wizard::job_application(Box::new(FileSlot::new(config.draft_dir())))?;
    let mut app = App::new(wizard, boundary);
    info!(draft_dir = %config.draft_dir().display(), "wizard started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    info!("wizard closed");
    Ok(())
}

/// Main application event loop.
///
/// Polls for key presses so a background submission can report back
/// while the applicant is idle. Continues until Esc in the form, or
/// Ctrl+Q / Ctrl+C anywhere.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.poll_submission();
        terminal.draw(|f| render_ui(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Esc if app.mode == AppMode::Form => return Ok(()),
                    KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
