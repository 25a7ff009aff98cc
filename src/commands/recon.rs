//! `--runrecon`: drive recon-ng against a workspace.
//!
//! With `--droplet` the run targets an existing droplet; without it a fresh
//! droplet is provisioned and bootstrapped first. On the fresh-droplet path
//! `--autocleanup` localizes the results into the workspace store and then
//! destroys the droplet so it stops billing.

use crate::cloud::{DigitalOcean, DropletApi};
use crate::commands::import::{fetch_result_file, import_workspace, SinkKind};
use crate::commands::setup::provision_and_bootstrap;
use crate::config::Config;
use crate::error::{BountyError, Result};
use crate::recon::OnError;
use crate::remote::Remote;
use crate::{recon, CommandHandler};

pub struct RunReconCommand {
    pub config: Config,
    pub droplet: Option<u64>,
    pub workspace: String,
    pub domains: Vec<String>,
    pub autocleanup: bool,
}

impl CommandHandler for RunReconCommand {
    fn handle(self) -> Result<()> {
        let api = DigitalOcean::new(self.config.api_key.clone());
        let fresh = self.droplet.is_none();
        let droplet = match self.droplet {
            Some(id) => api.get(id)?,
            None => provision_and_bootstrap(&api, &self.config)?,
        };

        let address = droplet
            .public_ip()
            .ok_or_else(|| {
                BountyError::provision_error(&format!(
                    "droplet {} has no public address",
                    droplet.id
                ))
            })?
            .to_string();

        println!("[*] Connecting to the droplet...");
        let remote = Remote::connect(&address, &self.config.ssh_key_filename)?;
        recon::run(
            &remote,
            &self.workspace,
            &self.domains,
            OnError::from_continue_flag(self.config.continue_on_error),
        )?;

        if fresh && self.autocleanup {
            fetch_result_file(&remote, &self.workspace)?;
            let stats = import_workspace(&self.config, &self.workspace, SinkKind::Sqlite)?;
            println!("[*] Localized results: {}", stats);

            println!("[*] Destroying the recon droplet...");
            api.delete(droplet.id)?;
            println!("[*] Destroyed.");
        }

        Ok(())
    }
}
