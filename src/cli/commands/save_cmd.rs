use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::cli::args::{Args, RenderArgs};
use crate::config::Config;
use crate::error::Result;

use super::{load_service, print_success, runtime, use_colors};

#[allow(clippy::needless_pass_by_value)]
pub fn run(
    id: String,
    directory: Option<PathBuf>,
    filename: Option<String>,
    force: bool,
    render: RenderArgs,
    args: &Args,
) -> Result<()> {
    let colors = use_colors(args.no_color);
    let config = Config::load()?;

    let path = runtime()?.block_on(async {
        let service = load_service(args, &config).await?;
        service
            .save(&id, directory, filename, force, render.into())
            .await
    })?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "id": id,
                "path": path.to_string_lossy(),
            })
        );
    } else if !args.quiet {
        let shown = path.display().to_string();
        let shown = if colors {
            shown.cyan().to_string()
        } else {
            shown
        };
        print_success(&format!("Saved {id} to {shown}"), colors);
    }

    Ok(())
}
