//! nutriprep CLI — spreadsheet-to-JSON preparation for nutrition data.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nutriprep",
    version,
    about = "Convert food and dish workbooks into linked JSON datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: nutriprep::cli::Commands,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = nutriprep::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
