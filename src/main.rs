use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use newsdesk::app::{App, StartView};
use newsdesk::config::Config;
use newsdesk::keybindings::KeybindingRegistry;
use newsdesk::storage::{Database, DatabaseError};
use newsdesk::sync::{FileSync, NoSync, SyncBackend};

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Terminal reader for a locally cached news store")]
struct Args {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file (default: ~/.local/share/newsdesk/newsdesk.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// JSON snapshot to sync from (overrides `sync_file` in the config)
    #[arg(long, value_name = "FILE")]
    sync_file: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Open the entries of one feed
    #[arg(long, value_name = "ID", conflicts_with = "bookmarks")]
    feed: Option<i64>,

    /// Open the bookmarks
    #[arg(long)]
    bookmarks: bool,
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home))
}

/// Create `dir` if needed and restrict it to the current user.
fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(dir, perms) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to set directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to read directory metadata"
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns stdout; logs go to stderr and only on request
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let args = Args::parse();
    let home = home_dir()?;

    let config_path = match args.config {
        Some(path) => path,
        None => home.join(".config").join("newsdesk").join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        eprintln!("Warning: {}", warning);
    }

    let db_path = match args.db {
        Some(path) => path,
        None => {
            let data_dir = home.join(".local").join("share").join("newsdesk");
            ensure_private_dir(&data_dir)?;
            data_dir.join("newsdesk.db")
        }
    };

    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdesk appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let sync: Arc<dyn SyncBackend> = match args.sync_file.or_else(|| config.sync_file.clone()) {
        Some(path) => {
            tracing::info!(path = %path.display(), "Syncing from snapshot file");
            Arc::new(FileSync::new(path))
        }
        None => Arc::new(NoSync),
    };

    let start = match (args.feed, args.bookmarks) {
        (Some(feed_id), _) => StartView::Feed(feed_id),
        (None, true) => StartView::Bookmarks,
        (None, false) => StartView::News,
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (failure_tx, failure_rx) = mpsc::unbounded_channel();

    let mut app = App::new(db, config, keybindings, sync, event_tx, failure_tx);
    app.start(start);

    newsdesk::ui::run(&mut app, event_rx, failure_rx).await?;

    println!("Goodbye!");
    Ok(())
}
