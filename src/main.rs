mod cli;
mod core;
mod logging;
mod tui;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    if let Err(err) = cli::execute(args).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
