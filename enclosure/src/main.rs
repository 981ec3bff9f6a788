//! Shim binary that calls into the `enclosure_daemon` library's `inner_main`.
use clap::Parser as _;
use enclosure_daemon::cli::Cli;
use eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    enclosure_daemon::inner_main(Cli::parse()).await
}
