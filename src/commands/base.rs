//! CLI flag surface and dispatch.
//!
//! The tool keeps the original flat flag interface rather than subcommands:
//! one of `--setupvm`, `--runrecon`, `--dbimport` or `--esimport` selects the
//! pipeline mode, the remaining flags parameterise it. Flag combinations are
//! validated up front so a half-specified run fails before any droplet is
//! touched, and the selected mode is dispatched through `CommandHandler`.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::commands::import::{ImportCommand, SinkKind};
use crate::commands::recon::RunReconCommand;
use crate::commands::setup::SetupVmCommand;
use crate::config::Config;
use crate::error::{BountyError, Result};
use crate::CommandHandler;

/// Command line tool for bounty management.
#[derive(Debug, Parser)]
#[command(name = "bounty", version)]
pub struct Cli {
    /// Config file to use rather than the default
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Setup a recon VM
    #[arg(long = "setupvm")]
    pub setupvm: bool,

    /// Verbose logging
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Execute recon-ng tasks
    #[arg(long = "runrecon")]
    pub runrecon: bool,

    /// Import the workspace results into the local database
    #[arg(long = "dbimport")]
    pub dbimport: bool,

    /// Cleanup and remove the VM when completed
    #[arg(long = "autocleanup")]
    pub autocleanup: bool,

    /// DigitalOcean droplet ID for execution
    #[arg(long = "droplet")]
    pub droplet: Option<u64>,

    /// List of domains to target
    #[arg(long = "domains", num_args = 1..)]
    pub domains: Vec<String>,

    /// Name of the workspace
    #[arg(long = "workspace")]
    pub workspace: Option<String>,

    /// Import the workspace results into Elasticsearch
    #[arg(long = "esimport")]
    pub esimport: bool,
}

/// The pipeline mode one invocation runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    SetupVm,
    RunRecon {
        droplet: Option<u64>,
        workspace: String,
        domains: Vec<String>,
        autocleanup: bool,
    },
    DbImport {
        droplet: u64,
        workspace: String,
    },
    EsImport {
        droplet: Option<u64>,
        workspace: String,
    },
}

impl Cli {
    /// Validate the flag combination, load the configuration, and dispatch
    /// the selected mode.
    pub fn handle(self) -> Result<()> {
        let mode = select_mode(&self)?;
        let config_path = self
            .config
            .unwrap_or_else(|| PathBuf::from("config.conf"));
        let config = Config::load(Path::new(&config_path))?;

        match mode {
            Mode::SetupVm => SetupVmCommand { config }.handle(),
            Mode::RunRecon {
                droplet,
                workspace,
                domains,
                autocleanup,
            } => RunReconCommand {
                config,
                droplet,
                workspace,
                domains,
                autocleanup,
            }
            .handle(),
            Mode::DbImport { droplet, workspace } => ImportCommand {
                config,
                droplet: Some(droplet),
                workspace,
                sink: SinkKind::Sqlite,
            }
            .handle(),
            Mode::EsImport { droplet, workspace } => ImportCommand {
                config,
                droplet,
                workspace,
                sink: SinkKind::Elastic,
            }
            .handle(),
        }
    }
}

/// Pick the pipeline mode from the parsed flags.
///
/// Exactly one of the mode flags must be set, and each mode's required
/// parameters must be present.
pub fn select_mode(cli: &Cli) -> Result<Mode> {
    let selected =
        [cli.setupvm, cli.runrecon, cli.dbimport, cli.esimport]
            .iter()
            .filter(|flag| **flag)
            .count();
    if selected == 0 {
        return Err(BountyError::validation_error(
            "no operation selected; pass one of --setupvm, --runrecon, --dbimport, --esimport",
        ));
    }
    if selected > 1 {
        return Err(BountyError::validation_error(
            "pass exactly one of --setupvm, --runrecon, --dbimport, --esimport",
        ));
    }

    if cli.setupvm {
        return Ok(Mode::SetupVm);
    }

    let workspace = cli
        .workspace
        .clone()
        .ok_or_else(|| BountyError::validation_error("--workspace is required"))?;

    if cli.runrecon {
        if cli.domains.is_empty() {
            return Err(BountyError::validation_error(
                "--runrecon requires --domains",
            ));
        }
        return Ok(Mode::RunRecon {
            droplet: cli.droplet,
            workspace,
            domains: cli.domains.clone(),
            autocleanup: cli.autocleanup,
        });
    }

    if cli.dbimport {
        let droplet = cli.droplet.ok_or_else(|| {
            BountyError::validation_error("--dbimport requires --droplet")
        })?;
        return Ok(Mode::DbImport { droplet, workspace });
    }

    Ok(Mode::EsImport {
        droplet: cli.droplet,
        workspace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bounty").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn setupvm_needs_nothing_else() {
        let mode = select_mode(&parse(&["--setupvm"])).unwrap();
        assert_eq!(mode, Mode::SetupVm);
    }

    #[test]
    fn no_mode_flag_is_rejected() {
        let error = select_mode(&parse(&["--workspace", "acme"])).unwrap_err();
        assert!(matches!(error, BountyError::ValidationError(_)));
    }

    #[test]
    fn two_mode_flags_are_rejected() {
        let error = select_mode(&parse(&["--runrecon", "--dbimport"])).unwrap_err();
        assert!(matches!(error, BountyError::ValidationError(_)));
    }

    #[test]
    fn runrecon_against_an_existing_droplet() {
        let mode = select_mode(&parse(&[
            "--runrecon",
            "--droplet",
            "1234",
            "--workspace",
            "acme",
            "--domains",
            "example.com",
            "example.org",
        ]))
        .unwrap();

        assert_eq!(
            mode,
            Mode::RunRecon {
                droplet: Some(1234),
                workspace: "acme".to_string(),
                domains: vec!["example.com".to_string(), "example.org".to_string()],
                autocleanup: false,
            }
        );
    }

    #[test]
    fn runrecon_without_domains_is_rejected() {
        let error =
            select_mode(&parse(&["--runrecon", "--workspace", "acme"])).unwrap_err();
        assert!(matches!(error, BountyError::ValidationError(_)));
    }

    #[test]
    fn dbimport_requires_a_droplet() {
        let error =
            select_mode(&parse(&["--dbimport", "--workspace", "acme"])).unwrap_err();
        assert!(matches!(error, BountyError::ValidationError(_)));

        let mode = select_mode(&parse(&[
            "--dbimport",
            "--droplet",
            "1234",
            "--workspace",
            "acme",
        ]))
        .unwrap();
        assert_eq!(
            mode,
            Mode::DbImport {
                droplet: 1234,
                workspace: "acme".to_string(),
            }
        );
    }

    #[test]
    fn esimport_works_with_and_without_a_droplet() {
        let local = select_mode(&parse(&["--esimport", "--workspace", "acme"])).unwrap();
        assert_eq!(
            local,
            Mode::EsImport {
                droplet: None,
                workspace: "acme".to_string(),
            }
        );

        let remote = select_mode(&parse(&[
            "--esimport",
            "--droplet",
            "9",
            "--workspace",
            "acme",
        ]))
        .unwrap();
        assert_eq!(
            remote,
            Mode::EsImport {
                droplet: Some(9),
                workspace: "acme".to_string(),
            }
        );
    }
}
