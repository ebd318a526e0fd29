use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod error;
mod info;
mod output;
mod split;
mod tree;
mod utils;

use error::Result;

#[derive(Parser)]
#[command(name = "pemtools")]
#[command(about = "Inspect, verify and split PEM certificate bundles", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the issuer forest of a bundle
    Tree {
        #[command(flatten)]
        config: tree::Config,
    },
    /// Write every certificate of a bundle to its own PEM file
    Split {
        #[command(flatten)]
        config: split::Config,
    },
    /// Tabulate the certificates of a bundle
    Info {
        #[command(flatten)]
        config: info::Config,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tree { config } => tree::execute(config)?,
        Commands::Split { config } => split::execute(config)?,
        Commands::Info { config } => info::execute(config)?,
    }

    Ok(())
}
