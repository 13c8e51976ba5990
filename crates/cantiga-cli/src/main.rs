use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use cantiga_resolver::{Config, Resolver};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cantiga", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.config/cantiga/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Resolve a song title + artist against the remote catalog
    ///
    /// Runs the full strategy ladder (direct, normalized, artist-first,
    /// title-only, artist-only) against the catalog's keyword search,
    /// re-ranking hits by title similarity and artist match. Prints the
    /// best match, or reports that nothing acceptable was found.
    ///
    /// The outbound search traffic is rate-limited according to the
    /// configured budget and policy; see `cantiga config show`.
    Resolve {
        /// Song title as found in local tags
        title: String,
        /// Artist name as found in local tags
        artist: String,
        /// Print the raw outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch only the lyric text from a song page URL
    Lyrics {
        /// Canonical song page URL (from a resolve match)
        url: String,
    },
    /// Fetch the full scraped content of a song page as JSON
    Page {
        /// Canonical song page URL (from a resolve match)
        url: String,
    },
    /// Inspect or initialize the configuration
    Config {
        #[command(subcommand)]
        action: commands::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Resolve {
            title,
            artist,
            json,
        } => {
            let resolver = Resolver::new(&config);
            commands::run_resolve(&resolver, &title, &artist, json).await?;
        }
        Commands::Lyrics { url } => {
            let resolver = Resolver::new(&config);
            commands::run_lyrics(&resolver, &url).await;
        }
        Commands::Page { url } => {
            let resolver = Resolver::new(&config);
            commands::run_page(&resolver, &url).await?;
        }
        Commands::Config { action } => {
            commands::run_config(&config, action)?;
        }
    }

    Ok(())
}
