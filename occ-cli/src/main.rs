//! OCC CLI - renders fill-percentage charts for bike-share stations and car parks.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "occ-cli",
    version,
    about = "Station occupancy chart toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: occ_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    occ_cmd::run(cli.command)
}
