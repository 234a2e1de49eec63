//! `casebook` — record, edit and share crimes from the terminal.
//!
//! # Usage
//!
//! ```
//! casebook                        # interactive list / detail UI
//! casebook list
//! casebook add "Stolen bike"
//! casebook report <ID> --subject
//! casebook --config ~/.config/casebook/casebook.toml export
//! ```

mod app;
mod commands;
mod settings;
mod ui;

use std::{
  fs::{self, File},
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use casebook_core::{photo::PhotoStore, store::CrimeStore};
use casebook_store_sqlite::SqliteStore;
use clap::Parser;
use commands::Command;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "casebook", version, about = "Record and track crimes")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "casebook.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  init_tracing(&settings, cli.command.is_none())?;

  if let Some(parent) = settings.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = Arc::new(
    SqliteStore::open(&settings.store_path)
      .await
      .with_context(|| format!("failed to open store {}", settings.store_path.display()))?,
  );
  let photos = PhotoStore::new(&settings.photo_dir);

  match cli.command {
    None => run_tui(store, photos, &settings).await,
    Some(command) => {
      let mut out = io::stdout().lock();
      commands::run(command, store.as_ref(), &photos, settings.sort, &mut out).await
    }
  }
}

/// Subcommands log to stderr. The TUI owns the terminal, so it only logs
/// when a log file is configured.
fn init_tracing(settings: &Settings, tui: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match &settings.log_file {
    Some(path) => {
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    None if !tui => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
    None => {}
  }
  Ok(())
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

async fn run_tui(store: Arc<SqliteStore>, photos: PhotoStore, settings: &Settings) -> Result<()> {
  let mut app = App::new(store, photos, settings.sort);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = match app.refresh().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };

  // A session left open by an error still gets its title default.
  app.close_detail().await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S: CrimeStore>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S>,
) -> Result<()> {
  loop {
    app.sync().await?;
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
