//! artfeed — browse two museum collections as one feed, in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//!                 Command                       FetchMsg
//! ┌──────────┐  (FetchPlan)  ┌──────────┐   (channel)   ┌──────────┐
//! │  app.rs  │ ────────────► │ fetch.rs │ ────────────► │  app.rs  │
//! │ (state)  │               │ (tokio)  │               │ apply()  │
//! └──────────┘               └──────────┘               └──────────┘
//!      ▲                          │                          │
//!      │ handle_key_event()       ▼                          ▼ draw()
//! ┌──────────┐               ┌────────────┐            ┌──────────┐
//! │ input.rs │               │ catalog.rs │            │  ui.rs   │
//! └──────────┘               └────────────┘            └──────────┘
//!                                 │
//!                         source/aic.rs, source/harvard.rs
//! ```
//!
//! * **`source/`** — the `ArtworkSource` trait and one adapter per museum.
//! * **`catalog`** — the façade that hides both adapters.
//! * **`feed`** — the aggregation controller: cursors, generations,
//!   merge, de-duplication, sorting.
//! * **`fetch`** — runs the controller's plans on tokio and reports back.
//! * **`favorites`** — the persisted exhibition.
//! * **`app`** / **`ui`** / **`input`** — state, rendering, key bindings.
//! * **`main`** — wires everything together: config, logging, the
//!   terminal, and the event loop.

mod app;
mod catalog;
mod config;
mod error;
mod favorites;
mod feed;
mod fetch;
mod input;
mod source;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use app::App;
use catalog::{Catalog, SourceSelection};
use config::{Cmd, Config};
use favorites::{FavoritesStore, FileBlobStore};
use feed::shuffle::RandomShuffle;
use feed::FeedController;
use fetch::Dispatcher;
use source::{AicSource, HarvardSource, SourceId};

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// The TUI owns stdout/stderr, so its log goes to a file.
fn init_file_logging(cfg: &Config) -> Result<()> {
    if let Some(parent) = cfg.log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("opening log file {}", cfg.log_file.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn init_stderr_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()?;
    Ok(())
}

/// Install the logger for this run, then build the catalog.  Logging comes
/// first so warnings raised while wiring up are kept.
fn setup(cfg: &Config) -> Result<Catalog> {
    match cfg.command {
        Some(_) => init_stderr_logging()?,
        None => init_file_logging(cfg)?,
    }
    build_catalog(cfg)
}

fn build_catalog(cfg: &Config) -> Result<Catalog> {
    let client = source::http_client(cfg.timeout).context("building HTTP client")?;
    let aic = AicSource::new(&cfg.aic_base_url, client.clone());
    let harvard = HarvardSource::new(&cfg.harvard_base_url, cfg.harvard_api_key.clone(), client);
    let catalog = Catalog::new(
        Arc::new(aic),
        Arc::new(harvard),
        Box::new(RandomShuffle::new(cfg.seed)),
    );
    for id in SourceId::ALL {
        if !catalog.is_available(id) {
            log::warn!("{} has no API key configured and will be skipped", id.label());
        }
    }
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

async fn run_command(cfg: &Config, catalog: &Catalog, cmd: &Cmd) -> Result<()> {
    match cmd {
        Cmd::List { page, json } => {
            let result = catalog
                .get_artworks(cfg.source, *page, cfg.page_size)
                .await
                .with_context(|| format!("fetching page {page} from {}", cfg.source))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            let estimate = if cfg.source == SourceSelection::All { "~" } else { "" };
            println!(
                "{} — page {} of {estimate}{} ({estimate}{} artworks)",
                cfg.source.label(),
                result.current_page,
                result.total_pages,
                result.total_records
            );
            for art in &result.records {
                println!(
                    "{:<18} {}  {}",
                    art.id,
                    art.title,
                    art.creator.as_deref().unwrap_or("")
                );
            }
        }
        Cmd::Show { id } => {
            let detail = catalog
                .get_artwork_details(id)
                .await
                .with_context(|| format!("fetching {id}"))?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cfg = config::load().context("Failed to load configuration")?;

    let catalog = setup(&cfg)?;
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;

    if let Some(cmd) = &cfg.command {
        return runtime.block_on(run_command(&cfg, &catalog, cmd));
    }

    install_panic_hook();
    // Fetch tasks are spawned from the UI thread.
    let _enter = runtime.enter();

    let favorites = FavoritesStore::load(Box::new(FileBlobStore::new(&cfg.data_dir)));
    let feed = FeedController::new(
        cfg.source,
        cfg.page_size,
        Box::new(RandomShuffle::new(cfg.seed)),
    );
    let (dispatcher, mut rx) = Dispatcher::new(Arc::new(catalog));

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(feed, favorites);
    app.start();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Send queued requests to the dispatcher.
    //   2. Apply any finished fetches.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        for command in app.take_commands() {
            dispatcher.dispatch(command);
        }

        while let Ok(msg) = rx.try_recv() {
            app.apply(msg);
        }
        app.expire_notice(Utc::now());

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    log::info!("exiting with {} artworks in the exhibition", app.favorites.len());
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
