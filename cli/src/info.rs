use certpool::bundle;
use chrono::{DateTime, Utc};
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::utils::{now, parse_time, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the PEM bundle. If not specified or `-`, reads from stdin
    file: Option<String>,

    /// Check validity at this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_time)]
    at: Option<DateTime<Utc>>,
}

#[derive(Tabled)]
struct CertRow {
    #[tabled(rename = "CN")]
    name: String,
    #[tabled(rename = "Issuer")]
    issuer: String,
    #[tabled(rename = "Expires")]
    not_after: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let pool = bundle::load(&input);
    let now = now(config.at);

    let rows = pool
        .iter()
        .map(|(_, cert)| CertRow {
            name: cert.display_name().to_string(),
            issuer: cert.issuer_name().to_string(),
            not_after: cert.validity().not_after().to_string(),
            status: match cert.is_valid_at(now) {
                Ok(()) => "valid".to_string(),
                Err(e) => e.to_string(),
            },
        })
        .collect::<Vec<_>>();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("Bundle contained {} expired certs", pool.count_expired(now));

    Ok(())
}
