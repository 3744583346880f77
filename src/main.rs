//! focusnoise - ambient noise and a focus timer in the terminal
//!
//! Plays white noise, pink ("rain") noise, or your own track while counting
//! down alternating intervals:
//! - 25 minutes of focused work
//! - 5 minutes of break

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use focusnoise::cli::{session, Cli, Commands, Display};
use focusnoise::config::Settings;
use focusnoise::store::{self, JsonFileStore};
use focusnoise::types::TimerSnapshot;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Run(args)) => {
            let mut settings = Settings::load()?;
            args.apply_to(&mut settings);
            settings.validate()?;
            session::run(&settings, &args).await?;
        }
        Some(Commands::Status { state }) => {
            let (settings, path) = resolve_state_path(state)?;
            let store = JsonFileStore::open(&path)
                .with_context(|| format!("状態ファイルを開けません: {}", path.display()))?;
            let snapshot = store::load_snapshot(&store, &settings.timer)
                .with_context(|| format!("状態ファイルが破損しています: {}", path.display()))?;
            Display::show_status(snapshot.as_ref());
        }
        Some(Commands::Reset { state, clear }) => {
            let (settings, path) = resolve_state_path(state)?;
            let mut store = JsonFileStore::open(&path)
                .with_context(|| format!("状態ファイルを開けません: {}", path.display()))?;
            if clear {
                store::clear_snapshot(&mut store)
                    .with_context(|| format!("状態ファイルに書き込めません: {}", path.display()))?;
                Display::show_clear_success();
            } else {
                let snapshot = TimerSnapshot::initial(&settings.timer);
                store::save_snapshot(&mut store, &snapshot)
                    .with_context(|| format!("状態ファイルに書き込めません: {}", path.display()))?;
                Display::show_reset_success(&snapshot);
            }
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Loads settings and picks the state file, preferring `--state`.
fn resolve_state_path(state: Option<PathBuf>) -> Result<(Settings, PathBuf)> {
    let settings = Settings::load()?;
    let path = state.unwrap_or_else(|| settings.state_path());
    Ok((settings, path))
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
