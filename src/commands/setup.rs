//! `--setupvm`: provision a recon droplet and install the toolchain.

use std::time::Duration;

use crate::cloud::{self, DigitalOcean, Droplet, DropletApi, PollPolicy};
use crate::config::Config;
use crate::error::{BountyError, Result};
use crate::remote::{CommandRunner, Remote};
use crate::CommandHandler;

/// Grace period between the droplet reporting active and sshd accepting
/// connections.
const SSH_GRACE: Duration = Duration::from_secs(30);

pub struct SetupVmCommand {
    pub config: Config,
}

impl CommandHandler for SetupVmCommand {
    fn handle(self) -> Result<()> {
        let api = DigitalOcean::new(self.config.api_key.clone());
        let droplet = provision_and_bootstrap(&api, &self.config)?;

        let address = droplet
            .public_ip()
            .map(str::to_string)
            .unwrap_or_else(|| "<no address>".to_string());
        println!("[*] Droplet {} is ready at {}", droplet.id, address);

        Ok(())
    }
}

/// Create a droplet, wait for it to become active, then run the bootstrap
/// script over SSH to install the recon toolchain.
///
/// Shared by `--setupvm` and the fresh-droplet `--runrecon` path. A failed
/// bootstrap is fatal: the droplet would not have recon-ng installed.
pub fn provision_and_bootstrap(api: &dyn DropletApi, config: &Config) -> Result<Droplet> {
    let policy = PollPolicy::from_config(config);
    let droplet = cloud::provision(api, config, &policy)?;

    let address = droplet.public_ip().ok_or_else(|| {
        BountyError::provision_error(&format!(
            "droplet {} is active but has no public address",
            droplet.id
        ))
    })?;
    println!("[*] Droplet has been created with the address {}", address);

    println!(
        "[*] Sleeping {} seconds to wait for SSH to be ready...",
        SSH_GRACE.as_secs()
    );
    std::thread::sleep(SSH_GRACE);

    println!("[*] Connecting to the droplet...");
    let remote = Remote::connect(address, &config.ssh_key_filename)?;

    println!("[*] Setting up the droplet with the configuration script...");
    let bootstrap = format!("wget -O - {} | bash", config.bootstrap_url);
    let output = remote.run_command(&bootstrap)?;
    if !output.success() {
        return Err(BountyError::remote_command_error(
            &bootstrap,
            output.exit_status,
        ));
    }
    println!("[*] Done setting up the droplet.");

    Ok(droplet)
}
