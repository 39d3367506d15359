use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::core::RenderOptions;

#[derive(Parser)]
#[command(
    name = "icon-mcp",
    about = "Search icon sets and save SVG icons, from the shell or an AI assistant over MCP",
    version,
    author
)]
#[command(after_help = "Examples:
  icon-mcp serve                          Run the MCP server on stdio
  icon-mcp search \"payment card\"          Search the catalog
  icon-mcp \"home\" --limit 5               Search (default command)
  icon-mcp save mdi:home ./icons          Save an icon as ./icons/home.svg
  icon-mcp --catalog icons.json search cart
")]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Load the catalog from these local files instead of the configured sources
    #[arg(long, global = true, env = "ICON_MCP_CATALOG", value_delimiter = ',')]
    pub catalog: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Show debug logs and detailed errors
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start MCP server for AI tool integration
    #[command(alias = "mcp")]
    Serve {},

    /// Search the icon catalog
    #[command(after_help = "Examples:
  icon-mcp search \"payment card\"
  icon-mcp search home --prefix mdi --limit 5
  icon-mcp search 付款 --json
")]
    Search {
        /// Search keywords
        query: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Skip this many ranked results
        #[arg(long, default_value = "0")]
        start: usize,

        /// Only icons in this category
        #[arg(long)]
        category: Option<String>,

        /// Only icons from these icon set prefixes
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },

    /// Save an icon as an SVG file
    #[command(after_help = "Examples:
  icon-mcp save mdi:home                  Save into the default export directory
  icon-mcp save mdi:home ./icons --filename house.svg
  icon-mcp save mdi:home ./icons --color '#ff0000' --width 48
")]
    Save {
        /// Icon id from search results
        id: String,

        /// Target directory (defaults to the configured export directory)
        directory: Option<PathBuf>,

        /// File name (derived from the icon name when omitted)
        #[arg(long)]
        filename: Option<String>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the SVG markup of an icon
    Show {
        /// Icon id from search results
        id: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// List icon collections in the catalog
    Collections {},

    /// Show or edit configuration
    Config {
        /// Configuration key to show/set
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Iconify rendering options
#[derive(clap::Args, Clone, Debug, Default)]
pub struct RenderArgs {
    /// Icon color, e.g. '#ff0000'
    #[arg(long)]
    pub color: Option<String>,

    /// Width, e.g. 24, 24px or auto
    #[arg(long)]
    pub width: Option<String>,

    /// Height, e.g. 24, 24px or auto
    #[arg(long)]
    pub height: Option<String>,

    /// Rotation, e.g. 90deg
    #[arg(long)]
    pub rotate: Option<String>,

    /// horizontal, vertical or horizontal,vertical
    #[arg(long)]
    pub flip: Option<String>,

    /// Add an empty bounding box rectangle
    #[arg(long = "box")]
    pub with_box: bool,
}

impl From<RenderArgs> for RenderOptions {
    fn from(args: RenderArgs) -> Self {
        Self {
            color: args.color,
            width: args.width,
            height: args.height,
            rotate: args.rotate,
            flip: args.flip,
            with_box: args.with_box,
        }
    }
}
