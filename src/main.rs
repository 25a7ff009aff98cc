//! Binary entrypoint for the `bounty` recon orchestration tool.
//!
//! Parses CLI flags and dispatches to the command handlers in `bounty_tools`.
//! The binary is intentionally a thin wrapper: flag parsing, logger setup and
//! dispatch happen here, while the real work (droplet provisioning, remote
//! recon runs and result imports) is performed by the command implementations
//! found in `bounty_tools::commands`.
//!
//! Examples
//!
//! Provision a recon droplet and install the toolchain:
//!
//! $ bounty --setupvm
//!
//! Run the full pipeline on a fresh droplet and clean up afterwards:
//!
//! $ bounty --runrecon --workspace acme --domains example.com example.org \
//!     --autocleanup
//!
//! Import results from an existing droplet into the local store:
//!
//! $ bounty --dbimport --droplet 3164444 --workspace acme
//!
//! Index already-downloaded results into Elasticsearch:
//!
//! $ bounty --esimport --workspace acme

use clap::Parser;

fn main() -> bounty_tools::error::Result<()> {
    let cli = bounty_tools::commands::base::Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    cli.handle()
}
