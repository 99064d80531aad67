use clap::Parser;
use usage_dashboard::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Snapshot { pretty } => cli::snapshot::run(pretty).await,
        Command::Import { file } => cli::import::run(&file).await,
    }
}
