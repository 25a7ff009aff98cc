//! `--dbimport` / `--esimport`: fetch and merge workspace results.
//!
//! With `--droplet` the recon-ng result file is first downloaded from the
//! droplet; without it the file is expected to already exist locally as
//! `<workspace>.db` (from an earlier fetch). The sink decides the semantics:
//! the SQLite store dedups, the Elasticsearch index appends.

use std::path::PathBuf;

use crate::cloud::{DigitalOcean, DropletApi};
use crate::config::Config;
use crate::error::{BountyError, Result};
use crate::import::elastic::ElasticSink;
use crate::import::store::SqliteSink;
use crate::import::{self, ImportStats};
use crate::remote::Remote;
use crate::CommandHandler;

/// Which target store receives the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Sqlite,
    Elastic,
}

pub struct ImportCommand {
    pub config: Config,
    pub droplet: Option<u64>,
    pub workspace: String,
    pub sink: SinkKind,
}

/// Remote directory recon-ng keeps the workspace database in.
pub fn remote_workspace_dir(workspace: &str) -> String {
    format!("/root/.recon-ng/workspaces/{}", workspace)
}

/// Local path the downloaded result file is stored at.
pub fn local_result_path(workspace: &str) -> PathBuf {
    PathBuf::from(format!("{}.db", workspace))
}

/// Local path of the workspace's dedup store.
pub fn store_path(workspace: &str) -> PathBuf {
    PathBuf::from(format!("{}_recon.db", workspace))
}

/// Download the workspace result file from the droplet.
pub fn fetch_result_file(remote: &Remote, workspace: &str) -> Result<()> {
    println!("[*] Downloading the recon-ng db...");
    remote.fetch(
        &remote_workspace_dir(workspace),
        "data.db",
        &local_result_path(workspace),
    )
}

/// Run the import against the configured sink and report the stats.
pub fn import_workspace(
    config: &Config,
    workspace: &str,
    sink: SinkKind,
) -> Result<ImportStats> {
    let result_file = local_result_path(workspace);

    let stats = match sink {
        SinkKind::Sqlite => {
            let mut sink = SqliteSink::open(&store_path(workspace))?;
            import::import(&result_file, workspace, &mut sink)?
        }
        SinkKind::Elastic => {
            let mut sink = ElasticSink::new(&config.elastic_url, &config.elastic_index);
            sink.ensure_index()?;
            import::import(&result_file, workspace, &mut sink)?
        }
    };

    Ok(stats)
}

impl CommandHandler for ImportCommand {
    fn handle(self) -> Result<()> {
        if let Some(id) = self.droplet {
            let api = DigitalOcean::new(self.config.api_key.clone());
            let droplet = api.get(id)?;
            let address = droplet.public_ip().ok_or_else(|| {
                BountyError::provision_error(&format!(
                    "droplet {} has no public address",
                    droplet.id
                ))
            })?;

            println!("[*] Connecting to the droplet...");
            let remote = Remote::connect(address, &self.config.ssh_key_filename)?;
            fetch_result_file(&remote, &self.workspace)?;
        }

        let stats = import_workspace(&self.config, &self.workspace, self.sink)?;
        println!("[*] Import complete: {}", stats);

        Ok(())
    }
}
