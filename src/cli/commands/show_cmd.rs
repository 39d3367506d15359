use std::io::Write;

use crate::cli::args::{Args, RenderArgs};
use crate::config::Config;
use crate::error::Result;

use super::{load_service, runtime};

pub fn run(id: &str, render: RenderArgs, args: &Args) -> Result<()> {
    let config = Config::load()?;

    let svg = runtime()?.block_on(async {
        let service = load_service(args, &config).await?;
        service.svg(id, &render.into()).await
    })?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "svg": String::from_utf8_lossy(&svg) })
        );
    } else {
        // Markup goes out in its own encoding
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&svg)?;
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
