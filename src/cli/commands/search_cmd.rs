use owo_colors::OwoColorize;

use crate::cli::args::Args;
use crate::config::Config;
use crate::core::Query;
use crate::error::Result;

use super::{load_service, runtime, use_colors};

#[allow(clippy::needless_pass_by_value)]
pub fn run(
    query: String,
    limit: Option<usize>,
    start: usize,
    category: Option<String>,
    prefixes: Vec<String>,
    args: &Args,
) -> Result<()> {
    let colors = use_colors(args.no_color);
    let config = Config::load()?;

    let request = Query {
        text: query.clone(),
        limit,
        start,
        category,
        prefixes,
    };

    let outcome = runtime()?.block_on(async {
        let service = load_service(args, &config).await?;
        service.search(&request).await
    })?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "results": outcome.results,
                "total": outcome.total,
                "start": outcome.start,
                "limit": outcome.limit,
                "query": query,
            })
        );
        return Ok(());
    }

    if args.quiet {
        return Ok(());
    }

    if outcome.results.is_empty() {
        if colors {
            println!("{} No icons for \"{}\"", "!".yellow(), query.cyan());
        } else {
            println!("No icons for \"{query}\"");
        }
        println!();
        println!("Suggestions:");
        println!("  • Check spelling");
        println!("  • Try broader or English keywords");
        println!("  • Drop --category / --prefix filters");
        return Ok(());
    }

    let id_width = outcome
        .results
        .iter()
        .map(|c| c.record.id.chars().count())
        .max()
        .unwrap_or(0);

    for candidate in &outcome.results {
        let record = &candidate.record;
        let padded = format!("{:<id_width$}", record.id);
        let tags = record.tags.join(", ");
        if colors {
            println!(
                "{}  {}  {}",
                padded.cyan(),
                format!("{:>5.2}", candidate.score).green(),
                record.name
            );
            println!("{}  {}", " ".repeat(id_width), tags.dimmed());
        } else {
            println!("{padded}  {:>5.2}  {}", candidate.score, record.name);
            println!("{}  {tags}", " ".repeat(id_width));
        }
    }

    let shown = outcome.start + outcome.results.len();
    let summary = format!(
        "─ Showing {}-{} of {} match{}",
        outcome.start + 1,
        shown,
        outcome.total,
        if outcome.total == 1 { "" } else { "es" }
    );
    println!();
    if colors {
        println!("{}", summary.dimmed());
    } else {
        println!("{summary}");
    }
    if shown < outcome.total && args.verbose {
        println!("Next page: --start {shown}");
    }

    Ok(())
}
