//! tech-tracker command-line entry point.
//!
//! ```text
//! tech-tracker fetch      [--config PATH] [--store PATH]
//! tech-tracker recommend  [--store PATH] [--limit N] [--output PATH]
//! tech-tracker modify     [--store PATH] (seen|unseen) ITEM_ID
//! tech-tracker import     INPUT [--yt-dlp] [--store PATH]
//! tech-tracker browse     [--store PATH] [--limit N]
//! ```
//!
//! Logs go to stderr (`RUST_LOG` or `--verbose`); stdout carries only
//! command output.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tech_tracker::app::App;
use tech_tracker::recommend::DEFAULT_LIMIT;
use tech_tracker::{commands, input, ui, JsonItemStore};

#[derive(Parser)]
#[command(name = "tech-tracker")]
#[command(version)]
#[command(about = "Track YouTube and RSS feeds and recommend what to watch next")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct StoreArg {
    /// Item store JSON file (default: ~/.tech-tracker/items.json)
    #[arg(long, env = "TECH_TRACKER_STORE")]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch configured sources and store new items
    Fetch {
        /// TOML sources file (default: ~/.config/tech-tracker/config.toml)
        #[arg(long, env = "TECH_TRACKER_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArg,
    },

    /// Write a Markdown recommendation report
    Recommend {
        #[command(flatten)]
        store: StoreArg,

        /// Items per section
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Report file
        #[arg(long, short, default_value = "recommend.md")]
        output: PathBuf,
    },

    /// Mark an item as seen or unseen
    Modify {
        #[command(flatten)]
        store: StoreArg,

        #[command(subcommand)]
        action: ModifyAction,
    },

    /// Add items from a JSON file or a yt-dlp dump
    Import {
        /// JSON file holding {"items": [...]} or a single item
        input: PathBuf,

        /// Read INPUT as a yt-dlp videos.jsonl dump
        #[arg(long)]
        yt_dlp: bool,

        #[command(flatten)]
        store: StoreArg,
    },

    /// Browse the latest items interactively
    Browse {
        #[command(flatten)]
        store: StoreArg,

        /// Items to list
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ModifyAction {
    /// Mark an item as seen
    Seen { item_id: String },
    /// Mark an item as unseen
    Unseen { item_id: String },
}

// ---------------------------------------------------------------------------
// Default paths
// ---------------------------------------------------------------------------

fn home_dir() -> Result<PathBuf> {
    dirs_next::home_dir().context("could not determine the home directory")
}

fn default_store_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".tech-tracker").join("items.json"))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("tech-tracker").join("config.toml"))
}

impl StoreArg {
    fn open(self) -> Result<JsonItemStore> {
        let path = match self.store {
            Some(path) => path,
            None => default_store_path()?,
        };
        Ok(JsonItemStore::new(path))
    }
}

// ---------------------------------------------------------------------------
// Terminal setup and teardown
// ---------------------------------------------------------------------------

/// Raw mode and the alternate screen, restored on [`Drop`].
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

/// Restore the terminal before the default hook prints a panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

fn browse(store: JsonItemStore, limit: usize) -> Result<()> {
    let mut app = App::load(store, limit)?;

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let tick_rate = Duration::from_millis(250);

    while !app.quit {
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch { config, store } => {
            let config_path = match config {
                Some(path) => path,
                None => {
                    let path = default_config_path()?;
                    if commands::ensure_config_file(&path)? {
                        println!("Created default config: {}", path.display());
                    }
                    path
                }
            };
            let store = store.open()?;

            let sources = commands::sources_from_config(&config_path)?;
            let new_items = commands::fetch_new_items(&sources, &store)?;
            let grouped = commands::group_by_source(&new_items);
            println!("{}", serde_json::to_string_pretty(&grouped)?);
        }

        Commands::Recommend { store, limit, output } => {
            let store = store.open()?;
            commands::write_recommend_report(&store, limit, &output)?;
            println!("Written to {}", output.display());
        }

        Commands::Modify { store, action } => {
            let store = store.open()?;
            let (item_id, seen) = match action {
                ModifyAction::Seen { item_id } => (item_id, true),
                ModifyAction::Unseen { item_id } => (item_id, false),
            };
            commands::set_seen(&store, &item_id, seen)?;
            println!("Marked item {item_id} as {}", if seen { "seen" } else { "unseen" });
        }

        Commands::Import { input, yt_dlp, store } => {
            let store = store.open()?;
            let summary = if yt_dlp {
                commands::import_yt_dlp(&store, &input)?
            } else {
                commands::import_items(&store, &input)?
            };
            println!(
                "Imported {} new item(s) ({} read, {} already stored)",
                summary.added,
                summary.read,
                summary.read - summary.added
            );
        }

        Commands::Browse { store, limit } => {
            browse(store.open()?, limit)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tech_tracker={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
