/// Cadence - personal music library and offline cache
use cadence_cli::{init_tracing, CadenceConfig, Stores};
use cadence_core::{Catalog, Track};
use cadence_downloads::{DownloadEntry, DownloadStatus};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Browse the catalog and manage favorites, history and downloads", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog
    Catalog {
        /// Only tracks whose title or artist contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Show listening history, most recent first
    History {
        /// Forget every play
        #[arg(long)]
        clear: bool,
    },
    /// Inspect the download cache
    Downloads {
        #[command(subcommand)]
        action: DownloadsAction,
    },
    /// Download a track into the local cache
    Download {
        /// Track id
        id: String,
    },
    /// Reset a track's download state
    Cancel {
        /// Track id
        id: String,
    },
    /// Delete a downloaded file
    Delete {
        /// Track id
        id: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites in the order they were added
    List,
    /// Add a track
    Add { id: String },
    /// Remove a track
    Remove { id: String },
}

#[derive(Subcommand)]
enum DownloadsAction {
    /// List every known download entry
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CadenceConfig::load(cli.config.as_deref())?;
    config.validate()?;
    init_tracing(&config.logging.filter);

    let stores = Stores::open(&config).await?;

    match cli.command {
        Commands::Catalog { search } => list_catalog(&stores, search.as_deref()),
        Commands::Favorites { action } => favorites(&stores, action).await?,
        Commands::History { clear } => history(&stores, clear).await,
        Commands::Downloads {
            action: DownloadsAction::List,
        } => list_downloads(&stores),
        Commands::Download { id } => download(&stores, &id).await?,
        Commands::Cancel { id } => {
            stores.downloads.cancel_download(&id).await;
            println!("Download state reset for {id}");
        }
        Commands::Delete { id } => {
            stores.downloads.delete_download(&id).await;
            println!("Deleted download for {id}");
        }
    }

    Ok(())
}

fn print_track(track: &Track) {
    println!(
        "  {:<8} {} - {}{}",
        track.id,
        track.artist,
        track.title,
        track
            .album
            .as_deref()
            .map(|album| format!(" [{album}]"))
            .unwrap_or_default()
    );
}

fn list_catalog(stores: &Stores, search: Option<&str>) {
    let tracks = match search {
        Some(query) => stores.catalog.search(query),
        None => stores.catalog.list_all().to_vec(),
    };

    println!("Tracks ({}):", tracks.len());
    for track in &tracks {
        print_track(track);
    }
}

async fn favorites(stores: &Stores, action: FavoritesAction) -> anyhow::Result<()> {
    match action {
        FavoritesAction::List => {
            let items = stores.favorites.items();
            println!("Favorites ({}):", items.len());
            for track in &items {
                print_track(track);
            }
        }
        FavoritesAction::Add { id } => {
            let track = stores.track(&id)?.clone();
            if stores.favorites.add_favorite(&track).await {
                println!("Added {} to favorites", track.title);
            } else {
                println!("{} is already a favorite", track.title);
            }
        }
        FavoritesAction::Remove { id } => {
            if stores.favorites.remove_favorite(&id).await {
                println!("Removed {id} from favorites");
            } else {
                println!("{id} is not a favorite");
            }
        }
    }
    Ok(())
}

async fn history(stores: &Stores, clear: bool) {
    if clear {
        stores.history.clear().await;
        stores.history.flush().await;
        println!("History cleared");
        return;
    }

    let tracks = stores.history.tracks();
    println!("Recently played ({}):", tracks.len());
    for track in &tracks {
        print_track(track);
    }
}

fn describe(entry: &DownloadEntry) -> String {
    match entry.status {
        DownloadStatus::NotDownloaded => "not downloaded".to_string(),
        DownloadStatus::Downloading => format!("downloading {:.0}%", entry.progress * 100.0),
        DownloadStatus::Downloaded => entry
            .local_uri
            .as_ref()
            .map(|path| format!("downloaded to {}", path.display()))
            .unwrap_or_else(|| "downloaded".to_string()),
        DownloadStatus::Error => format!(
            "failed: {}",
            entry.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn list_downloads(stores: &Stores) {
    let mut entries: Vec<_> = stores.downloads.downloads().into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Downloads ({}):", entries.len());
    for (id, entry) in &entries {
        let title = stores
            .catalog
            .by_id(id)
            .map_or("<not in catalog>", |t| t.title.as_str());
        println!("  {id:<8} {title}: {}", describe(entry));
    }
}

async fn download(stores: &Stores, id: &str) -> anyhow::Result<()> {
    let track = stores.track(id)?.clone();
    println!("Downloading {} - {}", track.artist, track.title);

    let downloads = stores.downloads.clone();
    let track_id = track.id.clone();
    let progress = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            ticker.tick().await;
            let entry = downloads.get_download_status(&track_id);
            if entry.is_downloading() {
                eprintln!("  {:.0}%", entry.progress * 100.0);
            }
        }
    });

    let entry = tokio::select! {
        entry = stores.downloads.start_download(&track) => entry,
        _ = tokio::signal::ctrl_c() => {
            stores.downloads.cancel_download(id).await;
            stores.downloads.get_download_status(id)
        }
    };
    progress.abort();

    println!("{}: {}", track.title, describe(&entry));
    Ok(())
}
