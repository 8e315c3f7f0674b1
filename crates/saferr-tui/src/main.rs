//! SAFERR console - a terminal user interface for brand owners.
//!
//! Sign in, browse the brand's products, generate verification codes and
//! review verification reports from the keyboard.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use saferr_core::{ApiClient, Config, FileStore, SessionStorage, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the cache directory while the TUI owns the terminal
const LOG_FILE_NAME: &str = "saferr.log";

const USAGE: &str = "Usage: saferr [--login | --logout | --whoami]";

/// What the binary was asked to do
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Tui,
    Login,
    Logout,
    WhoAmI,
    Help,
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Tui),
        Some("--login") => Ok(Command::Login),
        Some("--logout") => Ok(Command::Logout),
        Some("--whoami") => Ok(Command::WhoAmI),
        Some("-h") | Some("--help") => Ok(Command::Help),
        Some(other) => bail!("Unknown argument: {}\n{}", other, USAGE),
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). With a log
/// directory, output goes to a file there instead of stderr.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn cache_dir(config: &Config) -> PathBuf {
    config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"))
}

/// Wire the file-backed session record, the gateway and the session store
fn session_store(config: &Config) -> Result<SessionStore> {
    let storage = SessionStorage::new(Arc::new(FileStore::new(cache_dir(config))));
    let api = ApiClient::from_config(config, storage)?;
    Ok(SessionStore::new(api))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_command(&args)?;

    let (config, load_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let log_dir = (command == Command::Tui).then(|| cache_dir(&config));
    let _log_guard = init_tracing(log_dir.as_deref());
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    match command {
        Command::Tui => run_tui(config).await,
        Command::Login => login_cli(config).await,
        Command::Logout => logout_cli(config).await,
        Command::WhoAmI => whoami_cli(config).await,
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    info!("SAFERR console starting");

    let store = session_store(&config)?;
    store.initialize().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, store);

    // Signed out (or expired) goes straight to the login overlay
    app.sync_auth();
    if app.state != AppState::LoggingIn {
        app.refresh_current_page();
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("SAFERR console shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Apply completed fetches, then re-check the session they may have ended
        app.check_background_tasks();
        app.sync_auth();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Non-interactive commands
// ============================================================================

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(name) => print!("Username [{}]: ", name),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), default) {
        (true, Some(name)) => Ok(name.to_string()),
        (true, None) => bail!("Username required"),
        (false, _) => Ok(input.to_string()),
    }
}

/// Interactive sign-in from the command line
async fn login_cli(mut config: Config) -> Result<()> {
    println!("\n=== SAFERR Login ===\n");

    let default = std::env::var("SAFERR_USERNAME")
        .ok()
        .or_else(|| config.last_username.clone());
    let username = prompt_username(default.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;

    let store = session_store(&config)?;
    store.initialize().await;

    println!("\nAuthenticating...");
    if !store.login(&username, &password).await {
        bail!(store
            .last_error()
            .unwrap_or_else(|| "Login failed".to_string()));
    }

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if let Some(session) = store.session() {
        println!(
            "Signed in as {} ({}). Session expires {}.",
            session.username,
            session.brand_name,
            session.expiration.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

async fn logout_cli(config: Config) -> Result<()> {
    let store = session_store(&config)?;
    store.initialize().await;
    let was_signed_in = store.is_authenticated();
    store.logout();

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("No active session; stored credentials cleared.");
    }
    Ok(())
}

async fn whoami_cli(config: Config) -> Result<()> {
    let store = session_store(&config)?;
    store.initialize().await;

    match store.session().filter(|_| store.is_authenticated()) {
        Some(session) => {
            println!("User:    {} ({})", session.username, session.user_id);
            println!("Brand:   {} ({})", session.brand_name, session.brand_id);
            println!(
                "Expires: {} ({} min)",
                session.expiration.format("%Y-%m-%d %H:%M UTC"),
                session.minutes_until_expiry()
            );
            println!("API:     {}", store.api().base_url());
        }
        None => println!("Not signed in. Run `saferr --login`."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(&args(&["saferr"])).unwrap(), Command::Tui);
        assert_eq!(parse_command(&args(&["saferr", "--login"])).unwrap(), Command::Login);
        assert_eq!(parse_command(&args(&["saferr", "--logout"])).unwrap(), Command::Logout);
        assert_eq!(parse_command(&args(&["saferr", "--whoami"])).unwrap(), Command::WhoAmI);
        assert_eq!(parse_command(&args(&["saferr", "-h"])).unwrap(), Command::Help);
        assert!(parse_command(&args(&["saferr", "--bogus"])).is_err());
    }
}
