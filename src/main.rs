mod cli;
mod config;
mod core;
mod error;
mod mcp;

use clap::Parser;
use cli::args::{Args, Commands};
use cli::commands;
use error::Result;
use tracing_subscriber::EnvFilter;

/// Known subcommands - if first arg doesn't match, treat as search query
const KNOWN_COMMANDS: &[&str] = &[
    "serve",
    "mcp",
    "search",
    "save",
    "show",
    "collections",
    "config",
    "completions",
    "help",
];

fn main() {
    let args = rewrite_args_for_default_search(std::env::args().collect());
    let parsed = Args::parse_from(args);

    init_logging(&parsed);

    if let Err(e) = run_with_args(&parsed) {
        if parsed.debug {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e}");
            eprintln!("Run with --debug for more details.");
        }
        std::process::exit(1);
    }
}

/// Make "search" the default command.
///
/// Examples:
///   `icon-mcp "credit card"` → `icon-mcp search "credit card"`
///   `icon-mcp home --limit 3` → `icon-mcp search home --limit 3`
///   `icon-mcp save mdi:home` → unchanged
///   `icon-mcp --help` → unchanged
fn rewrite_args_for_default_search(args: Vec<String>) -> Vec<String> {
    let Some(first_arg) = args.get(1) else {
        return args;
    };

    if first_arg.starts_with('-') || KNOWN_COMMANDS.contains(&first_arg.as_str()) {
        return args;
    }

    let mut new_args = Vec::with_capacity(args.len() + 1);
    new_args.push(args[0].clone());
    new_args.push("search".to_string());
    new_args.extend(args[1..].iter().cloned());
    new_args
}

/// Logs go to stderr; stdout belongs to command output and the MCP protocol
fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "icon_mcp=debug"
    } else if args.verbose {
        "icon_mcp=info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color && std::env::var_os("NO_COLOR").is_none())
        .init();
}

fn run_with_args(args: &Args) -> Result<()> {
    if args.debug {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    match &args.command {
        Some(cmd) => run_command(cmd.clone(), args),
        None => {
            Args::parse_from(["icon-mcp", "--help"]);
            Ok(())
        }
    }
}

fn run_command(cmd: Commands, args: &Args) -> Result<()> {
    match cmd {
        Commands::Serve {} => run_mcp_server(args),
        Commands::Search {
            query,
            limit,
            start,
            category,
            prefixes,
        } => commands::search::run(query, limit, start, category, prefixes, args),
        Commands::Save {
            id,
            directory,
            filename,
            force,
            render,
        } => commands::save::run(id, directory, filename, force, render, args),
        Commands::Show { id, render } => commands::show::run(&id, render, args),
        Commands::Collections {} => commands::collections::run(args),
        Commands::Config { key, value, reset } => commands::config::run(key, value, reset, args),
        Commands::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
    }
}

fn run_mcp_server(args: &Args) -> Result<()> {
    let config = config::Config::load()?;

    commands::runtime()?.block_on(async {
        // A catalog that cannot load is fatal at startup
        let service = commands::load_service(args, &config).await?;
        mcp::run_mcp_server(service).await
    })
}
