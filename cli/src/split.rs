use std::path::PathBuf;

use certpool::bundle;
use certpool::export::{Exported, Exporter};
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use crate::error::Result;
use crate::utils::{now, parse_time, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the PEM bundle. If not specified or `-`, reads from stdin
    file: Option<String>,

    /// Directory the certificates are written to
    #[arg(short = 'o', long, short_alias = 'd', default_value = ".")]
    output_dir: PathBuf,

    /// Write expired certificates here. By default they are not written
    #[arg(long)]
    expired_dir: Option<PathBuf>,

    /// Check validity at this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_time)]
    at: Option<DateTime<Utc>>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    // fail on missing directories before touching the input
    let mut exporter = Exporter::new(config.output_dir, config.expired_dir)?;

    let input = read_input(config.file.as_deref())?;
    let pool = bundle::load(&input);
    let exported = exporter.export_all(&pool, now(config.at))?;

    let mut skipped = 0;
    for result in &exported {
        match result {
            Exported::Written(path) => println!("{}", path.display()),
            Exported::Skipped => skipped += 1,
        }
    }
    let written = exported.len() - skipped;
    info!(written, skipped, "bundle split");
    println!("Wrote {written} certificates, skipped {skipped} expired");

    Ok(())
}
