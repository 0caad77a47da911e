mod commands;
mod logging;

use clap::Parser;
use commands::Commands;

/// subtext-cli
#[derive(clap::Parser, Debug)]
#[command(name = "subtext", about = "Subword vocabulary construction and corpus encoding")]
pub struct Args {
    /// Subcommand to run.
    #[clap(subcommand)]
    pub command: Commands,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    args.command.run()
}
