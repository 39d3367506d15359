mod collections_cmd;
mod completions_cmd;
mod config_cmd;
mod save_cmd;
mod search_cmd;
mod show_cmd;

pub mod search {
    pub use super::search_cmd::run;
}
pub mod save {
    pub use super::save_cmd::run;
}
pub mod show {
    pub use super::show_cmd::run;
}
pub mod collections {
    pub use super::collections_cmd::run;
}
pub mod config {
    pub use super::config_cmd::run;
}
pub mod completions {
    pub use super::completions_cmd::run;
}

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::cli::args::Args;
use crate::config::{CatalogSource, Config};
use crate::core::{detect_source, IconService};
use crate::error::{AppError, Result};

/// Check if colors should be used
pub fn use_colors(no_color: bool) -> bool {
    if no_color {
        return false;
    }
    // Respect NO_COLOR environment variable
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Print success message
pub fn print_success(msg: &str, use_colors: bool) {
    if use_colors {
        println!("{} {}", "✓".green(), msg);
    } else {
        println!("✓ {msg}");
    }
}

/// Build the async runtime commands run on
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AppError::Other(format!("Failed to create runtime: {e}")))
}

/// Catalog sources for this invocation: `--catalog` files win over config
pub fn catalog_sources(args: &Args, config: &Config) -> Result<Vec<CatalogSource>> {
    if args.catalog.is_empty() {
        config.catalog_sources()
    } else {
        args.catalog.iter().map(|p| detect_source(p)).collect()
    }
}

/// Load the catalog, showing a spinner while remote collections download
pub async fn load_service(args: &Args, config: &Config) -> Result<IconService> {
    let sources = catalog_sources(args, config)?;

    let spinner = if sources.iter().any(CatalogSource::is_remote)
        && !args.quiet
        && !args.json
        && std::io::stderr().is_terminal()
    {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Loading icon catalog...");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let result = IconService::start(config, sources).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result
}
