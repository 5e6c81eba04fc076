//! PDI News command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pdi_news::capture::StillImageCamera;
use pdi_news::config::{self, AppConfig};
use pdi_news::news::{Article, NewsResponse, Source};
use pdi_news::storage;
use pdi_news::workflow::{
    CaptureError, ConsoleInput, ConsoleNotifier, EnterKeyTrigger, ImmediateTrigger,
    JsonStdoutDelivery,
};
use pdi_news::NewsApp;

/// PDI News - headlines, favorites and photo-to-text capture
#[derive(Parser, Debug)]
#[command(name = "pdi-news")]
#[command(about = "Read headlines, keep favorites, and extract text from photos")]
struct Args {
    /// Path to the config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show top headlines
    Headlines {
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Search articles
    Search {
        query: String,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Manage favorite articles
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Capture a photo and print the recognized text as JSON
    Scan {
        /// Image used as the camera feed
        #[arg(short, long)]
        image: PathBuf,
        /// Recognize the full frame instead of its central region
        #[arg(long)]
        no_crop: bool,
        /// Capture as soon as the camera is ready instead of waiting for Enter
        #[arg(long)]
        immediate: bool,
    },
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List saved articles
    List,
    /// Save an article
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    /// Remove a saved article
    Remove {
        #[arg(long)]
        url: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for command output
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match args.config {
        Some(path) => path,
        None => storage::get_config_dir()?.join("config.toml"),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run(args.command, &config_path));

    // A cancelled scan can leave a tesseract run on the blocking pool; don't wait for it
    runtime.shutdown_background();
    result
}

async fn run(command: Command, config_path: &Path) -> Result<()> {
    match command {
        Command::InitConfig { force } => init_config(config_path, force)?,
        Command::Headlines { page } => {
            let app = open_app(config_path)?;
            let response = app.repository().get_headlines(page).await?;
            print_articles(&response);
        }
        Command::Search { query, page } => {
            let app = open_app(config_path)?;
            let response = app.repository().search_news(&query, page).await?;
            print_articles(&response);
        }
        Command::Favorites { action } => run_favorites(&open_app(config_path)?, action)?,
        Command::Scan {
            image,
            no_crop,
            immediate,
        } => run_scan(&open_app(config_path)?, image, no_crop, immediate).await?,
    }

    Ok(())
}

fn open_app(config_path: &Path) -> Result<NewsApp> {
    NewsApp::new(load_or_create_config(config_path))
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(path: &Path) -> AppConfig {
    if path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => tracing::warn!("Ignoring config {:?}: {:#}", path, e),
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    config::save_config(&AppConfig::default(), path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn print_articles(response: &NewsResponse) {
    println!("{} results", response.total_results);
    for (i, article) in response.articles.iter().enumerate() {
        print_article(i + 1, article);
    }
}

fn print_article(index: usize, article: &Article) {
    println!("[{}] {}", index, article.display_title());
    if let Some(source) = &article.source.name {
        println!("    {}", source);
    }
    if let Some(url) = &article.url {
        println!("    {}", url);
    }
}

fn run_favorites(app: &NewsApp, action: FavoritesAction) -> Result<()> {
    let repository = app.repository();
    match action {
        FavoritesAction::List => {
            let favorites = repository.get_favorite_news()?;
            if favorites.is_empty() {
                println!("No favorites yet");
            }
            for (i, article) in favorites.iter().enumerate() {
                print_article(i + 1, article);
            }
        }
        FavoritesAction::Add {
            url,
            title,
            description,
            source,
        } => {
            let article = Article {
                title,
                description,
                url: Some(url),
                source: Source {
                    id: None,
                    name: source,
                },
                ..Default::default()
            };
            let existed = repository.find_favorite(article.url.as_deref().unwrap_or_default())?;
            repository.upsert(&Article {
                id: existed.as_ref().and_then(|a| a.id),
                ..article
            })?;
            if existed.is_some() {
                println!("Updated favorite");
            } else {
                println!("Added to favorites");
            }
        }
        FavoritesAction::Remove { url } => {
            let article = Article {
                url: Some(url.clone()),
                ..Default::default()
            };
            if repository.delete_article(&article)? {
                println!("Removed {}", url);
            } else {
                println!("{} is not a favorite", url);
            }
        }
    }
    Ok(())
}

async fn run_scan(app: &NewsApp, image: PathBuf, no_crop: bool, immediate: bool) -> Result<()> {
    let mut capture = app.capture_config()?;
    if no_crop {
        capture.crop_to_center = false;
    }

    let input = ConsoleInput::stdin().context("Failed to read terminal input")?;
    let workflow = app.capture_workflow(
        Arc::new(StillImageCamera::new(image)),
        Arc::new(ConsoleNotifier),
        capture,
        &input,
    );

    // Ctrl-C abandons the capture and releases the camera
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let report = if immediate {
        workflow.run(ImmediateTrigger, JsonStdoutDelivery, cancel).await
    } else {
        workflow
            .run(EnterKeyTrigger::new(input), JsonStdoutDelivery, cancel)
            .await
    };

    match report.outcome {
        Ok(_) | Err(CaptureError::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
