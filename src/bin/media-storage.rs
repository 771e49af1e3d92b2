//! media-storage CLI - inspect and fetch editor assets
//!
//! ## Example Usage
//!
//! ```bash
//! # Fetch a bundled sound from ./public/medialibraries
//! media-storage fetch Sound 83a9787d4cb6f3b7632b4ddfebf74367 --format wav -o pop.wav
//!
//! # Print the web-store URLs tried for a costume
//! media-storage urls ImageVector bcf454acf82e4504149f7ffe07081dbc --format svg
//!
//! # Show what a query string would dispatch
//! media-storage tutorial "?tutorial=getStarted"
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use media_storage::asset::{AssetType, DataFormat};
use media_storage::config::StorageConfig;
use media_storage::error::Result as StorageResult;
use media_storage::fetch::{FileFetcher, Fetcher};
use media_storage::query::{QueryParser, TutorialDispatch};
use media_storage::storage::Storage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// media-storage: editor asset storage tools
#[derive(Parser)]
#[command(name = "media-storage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and fetch editor assets", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an asset through the helper chain
    Fetch {
        /// Asset type (ImageVector, ImageBitmap, Sound, Project, Sprite)
        #[arg(value_name = "TYPE")]
        asset_type: String,

        /// Asset id
        #[arg(value_name = "ID")]
        asset_id: String,

        /// Data format (defaults to the type's usual format)
        #[arg(short = 'f', long)]
        format: Option<String>,

        /// Write the payload to this file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Print the payload as a data URI
        #[arg(long)]
        data_uri: bool,

        /// Also try the official web stores over HTTP
        #[arg(short = 'r', long)]
        remote: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the web-store URLs tried for an asset
    Urls {
        #[arg(value_name = "TYPE")]
        asset_type: String,

        #[arg(value_name = "ID")]
        asset_id: String,

        #[arg(short = 'f', long)]
        format: Option<String>,
    },

    /// Show the effective configuration
    Config,

    /// Show what a URL query string would dispatch
    Tutorial {
        /// Query string, e.g. "?tutorial=all"
        #[arg(value_name = "QUERY")]
        query: String,
    },
}

#[derive(Serialize)]
struct FetchSummary {
    asset_type: String,
    asset_id: String,
    data_format: String,
    bytes: usize,
    output: Option<PathBuf>,
}

struct FetchConfig {
    asset_type: String,
    asset_id: String,
    format: Option<String>,
    output: Option<PathBuf>,
    data_uri: bool,
    remote: bool,
    json: bool,
    verbose: bool,
    config: StorageConfig,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match StorageConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load config: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    if cli.verbose {
        println!(
            "{} v{}",
            "media-storage".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Root dir: {}",
            config.root_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::Fetch {
            asset_type,
            asset_id,
            format,
            output,
            data_uri,
            remote,
            json,
        } => {
            fetch_asset(FetchConfig {
                asset_type,
                asset_id,
                format,
                output,
                data_uri,
                remote,
                json,
                verbose: cli.verbose,
                config,
            })
            .await
        }

        Commands::Urls {
            asset_type,
            asset_id,
            format,
        } => show_urls(&asset_type, &asset_id, format.as_deref(), &config),

        Commands::Config => show_config(&config),

        Commands::Tutorial { query } => {
            show_tutorial(&query);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn parse_target(asset_type: &str, format: Option<&str>) -> StorageResult<(AssetType, DataFormat)> {
    let asset_type: AssetType = asset_type.parse()?;
    let data_format = match format {
        Some(format) => format.parse()?,
        None => asset_type.default_format(),
    };
    Ok((asset_type, data_format))
}

#[cfg(feature = "http")]
fn remote_fetcher(config: &StorageConfig) -> StorageResult<Arc<dyn Fetcher>> {
    use media_storage::error::StorageError;
    use media_storage::fetch::HttpFetcher;

    let fetcher = HttpFetcher::new().map_err(|e| StorageError::Config(e.to_string()))?;
    let fetcher = match &config.base_url {
        Some(base) => fetcher
            .with_base_url(base)
            .map_err(|e| StorageError::Config(e.to_string()))?,
        None => fetcher,
    };
    Ok(Arc::new(fetcher))
}

#[cfg(not(feature = "http"))]
fn remote_fetcher(_config: &StorageConfig) -> StorageResult<Arc<dyn Fetcher>> {
    Err(media_storage::error::StorageError::Config(
        "built without the `http` feature".to_string(),
    ))
}

async fn fetch_asset(cfg: FetchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (asset_type, data_format) = parse_target(&cfg.asset_type, cfg.format.as_deref())?;

    let fetcher: Arc<dyn Fetcher> = if cfg.remote {
        remote_fetcher(&cfg.config)?
    } else {
        Arc::new(FileFetcher::new(cfg.config.root_dir.clone()))
    };

    let mut storage = Storage::new(cfg.config, fetcher);
    storage.add_local_web_stores();
    if cfg.remote {
        storage.add_official_web_stores();
    }

    if cfg.verbose {
        println!(
            "  {} {} {}.{}",
            "Loading:".bold(),
            asset_type,
            cfg.asset_id,
            data_format
        );
    }

    let asset = storage
        .load(asset_type, &cfg.asset_id, data_format)
        .await?
        .ok_or_else(|| format!("No helper provides {} {}", asset_type, cfg.asset_id))?;

    if let Some(path) = &cfg.output {
        fs::write(path, asset.data())?;
    }

    if cfg.data_uri {
        println!("{}", asset.encode_data_uri(None));
        return Ok(());
    }

    let summary = FetchSummary {
        asset_type: asset_type.to_string(),
        asset_id: cfg.asset_id,
        data_format: data_format.to_string(),
        bytes: asset.data().len(),
        output: cfg.output,
    };

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", "Asset loaded".green().bold());
        println!("  {} {}", "Type:".bold(), summary.asset_type);
        println!("  {} {}", "Id:".bold(), summary.asset_id);
        println!("  {} {}", "Format:".bold(), summary.data_format);
        println!("  {} {}", "Size:".bold(), format!("{} bytes", summary.bytes).cyan());
        if let Some(path) = &summary.output {
            println!("  {} {}", "Written to:".bold(), path.display());
        }
    }

    Ok(())
}

fn show_urls(
    asset_type: &str,
    asset_id: &str,
    format: Option<&str>,
    config: &StorageConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (asset_type, data_format) = parse_target(asset_type, format)?;

    let fetcher: Arc<dyn Fetcher> = Arc::new(FileFetcher::new(config.root_dir.clone()));
    let mut storage = Storage::new(config.clone(), fetcher);
    storage.add_official_web_stores();

    if storage.local().serves(asset_type) {
        println!(
            "  {} {}",
            "local".yellow(),
            storage.local().asset_path(asset_id, data_format)
        );
    }
    for url in storage.web_urls(asset_type, asset_id, data_format) {
        println!("  {} {}", "web".cyan(), url);
    }

    Ok(())
}

fn show_config(config: &StorageConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    if let Some(path) = StorageConfig::default_path() {
        println!("  {} {}", "Default file:".bold(), path.display());
    }
    println!();
    print!("{}", config.to_toml_string()?);
    Ok(())
}

struct PrintDispatch;

impl TutorialDispatch for PrintDispatch {
    fn open_tips_library(&mut self) {
        println!("{} open tips library", "dispatch:".green().bold());
    }

    fn update_deck(&mut self, tutorial_id: &str) {
        println!("{} update deck {}", "dispatch:".green().bold(), tutorial_id.cyan());
    }
}

fn show_tutorial(query: &str) {
    let parser = QueryParser::new(query);
    if !parser.apply(&mut PrintDispatch) {
        println!("{}", "No tutorial requested".dimmed());
    }
}
