use certpool::report::{Summary, TreeReport, render_tree};
use certpool::{ForestBuilder, bundle};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::error::Result;
use crate::output::OutputFormat;
use crate::utils::{now, parse_time, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the PEM bundle. If not specified or `-`, reads from stdin
    file: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Verify signatures on all cores
    #[arg(long)]
    parallel: bool,

    /// Check validity at this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_time)]
    at: Option<DateTime<Utc>>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let pool = bundle::load(&input);
    let forest = ForestBuilder::default()
        .parallel(config.parallel)
        .build(pool);
    let now = now(config.at);

    match config.output {
        OutputFormat::Text => {
            print!("{}", render_tree(&forest, now));
            println!();
            println!("{}", Summary::from_forest(&forest, now));
        }
        OutputFormat::Json => {
            let report = TreeReport::new(&forest, now);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
