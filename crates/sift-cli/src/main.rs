use std::env;

use clap::Parser;
use cli::{Args, Commands};
use error::CliResult;
use list::list_entities;
use logging::setup_logging;
use query::{count_rows, render_sql, SqlOptions};
use sift_config::config::{config_path, generate_default_config, set_config_path, Config};
use sift_filter::Declarative;
use tracing::{debug, info};
use utils::set_color;

mod cli;
mod error;
mod list;
mod logging;
mod query;
mod utils;

fn load_filters() -> CliResult<Declarative> {
    let config = Config::new()?;
    debug!(
        "loaded {} entities from {}",
        config.entities.len(),
        config_path().display()
    );
    Ok(Declarative::from_config(&config)?)
}

fn handle_config(init: bool) -> CliResult<()> {
    if init {
        let path = generate_default_config()?;
        info!("Wrote {}", path.display());
        return Ok(());
    }

    let doc = Config::new()?.to_annotated_document()?;
    info!("{}", doc.to_string().trim_end());
    Ok(())
}

fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        set_color(false);
    }

    if let Some(ref path) = args.config {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            env::current_dir()?.join(path)
        };
        set_config_path(path);
    }

    match args.command {
        Commands::Config { init } => handle_config(init)?,
        Commands::Entities => list_entities(&load_filters()?),
        Commands::Sql {
            filter,
            inline,
            count,
            page,
            per_page,
        } => {
            let options = SqlOptions {
                inline,
                count,
                page,
                per_page,
            };
            render_sql(&load_filters()?, &filter, &options)?;
        }
        Commands::Count { db, filter } => count_rows(&load_filters()?, &db, &filter)?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
