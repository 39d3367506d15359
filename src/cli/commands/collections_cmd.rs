use owo_colors::OwoColorize;

use crate::cli::args::Args;
use crate::config::Config;
use crate::error::Result;

use super::{load_service, runtime, use_colors};

pub fn run(args: &Args) -> Result<()> {
    let colors = use_colors(args.no_color);
    let config = Config::load()?;

    let (collections, icons) = runtime()?.block_on(async {
        let service = load_service(args, &config).await?;
        Ok::<_, crate::error::AppError>((service.collections().await, service.icon_count().await))
    })?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "collections": collections,
                "total": collections.len(),
                "icons": icons,
            })
        );
        return Ok(());
    }

    if args.quiet {
        return Ok(());
    }

    for collection in &collections {
        let prefix = collection.prefix.as_deref().unwrap_or("(none)");
        if colors {
            println!("{:<24} {}", prefix.blue(), collection.total.to_string().green());
        } else {
            println!("{prefix:<24} {}", collection.total);
        }
    }
    println!();
    println!(
        "{} collection{}, {icons} icon{}",
        collections.len(),
        if collections.len() == 1 { "" } else { "s" },
        if icons == 1 { "" } else { "s" }
    );

    Ok(())
}
