use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::cli::args::Args;
use crate::config::Config;
use crate::error::{AppError, Result};

use super::use_colors;

/// Keys settable from the command line
const KEYS: &[&str] = &[
    "user_agent",
    "request_timeout_secs",
    "default_limit",
    "max_limit",
    "default_export_dir",
    "overwrite_existing",
];

fn parse<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid {what}: {value}")))
}

fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "user_agent" => config.user_agent = value.to_string(),
        "request_timeout_secs" => config.request_timeout_secs = parse(value, "number")?,
        "default_limit" => config.default_limit = parse(value, "number")?,
        "max_limit" => config.max_limit = parse(value, "number")?,
        "default_export_dir" => config.default_export_dir = PathBuf::from(value),
        "overwrite_existing" => config.overwrite_existing = parse(value, "boolean")?,
        _ => return Err(AppError::Config(format!("Unknown config key: {key}"))),
    }
    config.validate()
}

fn get_value(config: &Config, key: &str) -> Result<String> {
    Ok(match key {
        "user_agent" => config.user_agent.clone(),
        "request_timeout_secs" => config.request_timeout_secs.to_string(),
        "default_limit" => config.default_limit.to_string(),
        "max_limit" => config.max_limit.to_string(),
        "default_export_dir" => config.default_export_dir.display().to_string(),
        "overwrite_existing" => config.overwrite_existing.to_string(),
        _ => return Err(AppError::Config(format!("Unknown config key: {key}"))),
    })
}

pub fn run(key: Option<String>, value: Option<String>, reset: bool, args: &Args) -> Result<()> {
    let colors = use_colors(args.no_color);
    let config_path = Config::config_file_path()?;

    if reset {
        std::fs::create_dir_all(Config::config_dir()?)?;
        Config::default().save()?;
        if !args.quiet {
            println!("Configuration reset to defaults.");
        }
        return Ok(());
    }

    if let Some(key) = key {
        let mut config = Config::load()?;
        if let Some(value) = value {
            set_value(&mut config, &key, &value)?;
            config.save()?;
            if !args.quiet {
                println!("Set {key} = {value}");
            }
        } else {
            println!("{}", get_value(&config, &key)?);
        }
        return Ok(());
    }

    let config = Config::load()?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "config_path": config_path.to_string_lossy(),
                "config": config,
            })
        );
        return Ok(());
    }

    if colors {
        println!("{}", "Configuration".blue().bold());
        println!("{}", "─".repeat(40).dimmed());
    } else {
        println!("Configuration");
        println!("{}", "─".repeat(40));
    }

    println!("Config file: {}", config_path.display());
    println!();
    for key in KEYS {
        println!("{key}: {}", get_value(&config, key)?);
    }

    println!();
    println!("sources:");
    for source in &config.sources {
        println!("  - {}", serde_json::to_string(source)?);
    }
    println!("iconify_hosts:");
    for host in &config.iconify_hosts {
        println!("  - {host}");
    }
    println!("query_aliases: {} terms", config.query_aliases.len());

    println!();
    if colors {
        println!(
            "{} Set value: {}",
            "Tip:".dimmed(),
            "icon-mcp config default_limit 20".cyan()
        );
    } else {
        println!("Tip: Set value: icon-mcp config default_limit 20");
    }

    Ok(())
}
