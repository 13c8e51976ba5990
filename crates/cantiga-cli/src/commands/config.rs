use anyhow::Result;

use cantiga_resolver::config::{config_file_path, ensure_config_file};
use cantiga_resolver::Config;

#[derive(Debug, clap::Subcommand)]
pub enum ConfigAction {
    /// Write a commented example config file if none exists
    Init,
    /// Print the effective configuration as JSON
    Show,
    /// Print the config file path
    Path,
}

/// Inspect or initialize the configuration.
pub fn run_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let created = ensure_config_file()?;
            let path = config_file_path();
            if created {
                println!("Created {}", path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_file_path().display());
        }
    }
    Ok(())
}
