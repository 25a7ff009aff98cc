//! Configuration file loading.
//!
//! The tool reads a sectioned key/value file (INI syntax), `config.conf` by
//! default. Required keys are the DigitalOcean API token and the SSH private
//! key path; everything else falls back to defaults matching the original
//! deployment.
//!
//! Example:
//!
//! ```text
//! [DigitalOcean]
//! api_key = dop_v1_...
//! ssh_key_filename = ~/.ssh/id_rsa
//! region = nyc1
//! image = ubuntu-16-04-x64
//! size = 512mb
//! poll_interval_secs = 30
//! max_poll_attempts = 20
//!
//! [Recon]
//! continue_on_error = false
//!
//! [Elasticsearch]
//! url = http://localhost:9200
//! index = bug_bounty
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{BountyError, Result};

/// Bootstrap script installed on fresh droplets. The droplet fetches it
/// itself, so the URL can be overridden per deployment with the
/// `bootstrap_url` key.
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://gist.githubusercontent.com/gradiuscypher/692b62959734d6c8416314f4f5ae5756/raw/29eb0cab8d545d5fbad6dc9f10a9285526a5d37b/gistfile1.txt";

/// Parsed configuration for one invocation of the tool.
#[derive(Debug, Clone)]
pub struct Config {
    /// DigitalOcean API token.
    pub api_key: String,
    /// Path to the SSH private key used for droplet logins, `~` expanded.
    pub ssh_key_filename: PathBuf,
    /// Region slug for new droplets.
    pub region: String,
    /// Image slug for new droplets.
    pub image: String,
    /// Size slug for new droplets.
    pub size: String,
    /// Name assigned to new droplets.
    pub droplet_name: String,
    /// URL of the toolchain bootstrap script run on fresh droplets.
    pub bootstrap_url: String,
    /// Seconds between droplet status polls while provisioning.
    pub poll_interval_secs: u64,
    /// Maximum number of status polls before provisioning fails.
    pub max_poll_attempts: u32,
    /// Whether a failed recon-ng command aborts the run or is only reported.
    pub continue_on_error: bool,
    /// Base URL of the Elasticsearch cluster.
    pub elastic_url: String,
    /// Name of the Elasticsearch index.
    pub elastic_index: String,
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// Missing required keys (`api_key`, `ssh_key_filename` in the
    /// `[DigitalOcean]` section) are a `ConfigError`; optional keys default.
    pub fn load(path: &Path) -> Result<Self> {
        let file = Ini::load_from_file(path)?;

        let digitalocean = file.section(Some("DigitalOcean")).ok_or_else(|| {
            BountyError::config_error("missing [DigitalOcean] section in config file")
        })?;
        let api_key = digitalocean
            .get("api_key")
            .ok_or_else(|| BountyError::config_error("missing DigitalOcean api_key"))?
            .to_string();
        let ssh_key_filename = digitalocean
            .get("ssh_key_filename")
            .ok_or_else(|| BountyError::config_error("missing DigitalOcean ssh_key_filename"))?;
        let ssh_key_filename =
            PathBuf::from(shellexpand::tilde(ssh_key_filename).into_owned());

        let recon = file.section(Some("Recon"));
        let elastic = file.section(Some("Elasticsearch"));

        Ok(Config {
            api_key,
            ssh_key_filename,
            region: get_or(digitalocean.get("region"), "nyc1"),
            image: get_or(digitalocean.get("image"), "ubuntu-16-04-x64"),
            size: get_or(digitalocean.get("size"), "512mb"),
            droplet_name: get_or(digitalocean.get("droplet_name"), "recon-droplet"),
            bootstrap_url: get_or(digitalocean.get("bootstrap_url"), DEFAULT_BOOTSTRAP_URL),
            poll_interval_secs: parse_or(digitalocean.get("poll_interval_secs"), 30)?,
            max_poll_attempts: parse_or(digitalocean.get("max_poll_attempts"), 20)?,
            continue_on_error: parse_or(
                recon.and_then(|section| section.get("continue_on_error")),
                false,
            )?,
            elastic_url: get_or(
                elastic.and_then(|section| section.get("url")),
                "http://localhost:9200",
            ),
            elastic_index: get_or(
                elastic.and_then(|section| section.get("index")),
                "bug_bounty",
            ),
        })
    }
}

fn get_or(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw.parse().map_err(|_| {
            BountyError::config_error(&format!("invalid config value: {}", raw))
        }),
        None => Ok(default),
    }
}
