use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::LevelFilter;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{env, io, time::Duration};

use asmstudio::app::App;
use asmstudio::editor_view::{FileKind, LoadParams};
use asmstudio::ui;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger with debug fallback for development
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("asmstudio", LevelFilter::Debug);
    }
    logger.init();

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    if let Err(e) = enable_raw_mode() {
        eprintln!("Failed to initialize the terminal: {}", e);
        return Err(e.into());
    }
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        eprintln!("Failed to configure the terminal: {}", e);
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let args: Vec<String> = env::args().collect();
    let mut app = match App::new().await {
        Ok(app) => {
            log::info!("Application initialized successfully");
            app
        }
        Err(e) => {
            restore_terminal()?;
            eprintln!("Failed to initialize the application: {}", e);
            return Err(e);
        }
    };

    // Load a program passed on the command line
    if args.len() > 1 {
        let params = LoadParams {
            path: std::path::PathBuf::from(&args[1]),
            kind: FileKind::Assembly,
        };
        app.load_program(params).await;
    } else {
        log::info!("No file specified, starting with an empty program");
    }

    let res = run_app(&mut terminal, app).await;

    restore_terminal()?;

    if let Err(err) = res {
        eprintln!("The application stopped with an error: {}", err);
        log::error!("Application error: {}", err);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        if let Err(e) = terminal.draw(|f| ui::draw(f, &mut app)) {
            log::error!("Terminal draw error: {}", e);
            // Continue running despite draw errors
        }

        app.update_status();

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if let Err(e) = handle_key_event_safe(key, &mut app).await {
                        log::error!("Key event handling error: {}", e);
                        app.ui.set_error(format!("Key handling error: {}", e));
                    }
                }
                Event::Resize(_, _) => {
                    log::info!("Terminal resized");
                    // Handled implicitly through the next draw
                }
                Event::Mouse(_) => {
                    // Ignore mouse events for now
                }
                _ => {}
            }
        }
    }

    log::info!("Application loop ended successfully");
    Ok(())
}

async fn handle_key_event_safe(key: crossterm::event::KeyEvent, app: &mut App) -> Result<()> {
    // Ctrl+C behaves like the quit action, including the unsaved-work
    // confirmation.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(event::KeyModifiers::CONTROL) {
        log::info!("Exit requested via Ctrl+C");
        app.quit_requested();
        return Ok(());
    }

    app.handle_key_event(key).await
}

/// Restore terminal to normal state
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    // Attempt to show cursor, but don't fail if it errors
    let _ = execute!(stdout, crossterm::cursor::Show);
    Ok(())
}
