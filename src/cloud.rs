//! DigitalOcean droplet lifecycle.
//!
//! A blocking client for the handful of droplet endpoints the pipeline needs:
//! create, inspect, destroy, and listing the account SSH keys that get
//! installed on new droplets. Provisioning polls the droplet status at a fixed
//! interval until it reports `active`, bounded by a maximum attempt count so a
//! droplet that never comes up fails the run instead of hanging it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{BountyError, Result};

const API_BASE: &str = "https://api.digitalocean.com/v2";

/// A droplet as reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    /// Lifecycle status string; `"active"` means ready.
    pub status: String,
    #[serde(default)]
    pub networks: Networks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Droplet {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// The droplet's public IPv4 address, once the provider has assigned one.
    pub fn public_ip(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|network| network.kind == "public")
            .map(|network| network.ip_address.as_str())
    }
}

/// Request body for droplet creation.
#[derive(Debug, Serialize)]
pub struct DropletRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub ssh_keys: Vec<u64>,
    pub backups: bool,
}

impl DropletRequest {
    /// Build a creation request from the configuration, installing the given
    /// account SSH keys.
    pub fn from_config(config: &Config, ssh_keys: Vec<u64>) -> Self {
        DropletRequest {
            name: config.droplet_name.clone(),
            region: config.region.clone(),
            size: config.size.clone(),
            image: config.image.clone(),
            ssh_keys,
            backups: false,
        }
    }
}

/// The droplet operations the pipeline depends on.
///
/// `DigitalOcean` is the production implementation; tests substitute fakes to
/// exercise the provisioning loop without a provider account.
pub trait DropletApi {
    fn create(&self, request: &DropletRequest) -> Result<Droplet>;
    fn get(&self, id: u64) -> Result<Droplet>;
    fn delete(&self, id: u64) -> Result<()>;
    /// Ids of every SSH key registered on the account.
    fn ssh_key_ids(&self) -> Result<Vec<u64>>;
}

/// Blocking DigitalOcean API client with bearer-token auth.
pub struct DigitalOcean {
    client: reqwest::blocking::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DropletEnvelope {
    droplet: Droplet,
}

#[derive(Debug, Deserialize)]
struct SshKeysEnvelope {
    ssh_keys: Vec<SshKey>,
}

#[derive(Debug, Deserialize)]
struct SshKey {
    id: u64,
}

impl DigitalOcean {
    pub fn new(token: String) -> Self {
        DigitalOcean {
            client: reqwest::blocking::Client::new(),
            token,
            base_url: API_BASE.to_string(),
        }
    }

    /// Check the response status and surface non-success bodies as API errors.
    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(BountyError::api_error(status.as_u16(), &body))
    }
}

impl DropletApi for DigitalOcean {
    fn create(&self, request: &DropletRequest) -> Result<Droplet> {
        let response = self
            .client
            .post(format!("{}/droplets", self.base_url))
            .bearer_auth(&self.token)
            .json(request)
            .send()?;
        let envelope: DropletEnvelope = Self::check(response)?.json()?;

        Ok(envelope.droplet)
    }

    fn get(&self, id: u64) -> Result<Droplet> {
        let response = self
            .client
            .get(format!("{}/droplets/{}", self.base_url, id))
            .bearer_auth(&self.token)
            .send()?;
        let envelope: DropletEnvelope = Self::check(response)?.json()?;

        Ok(envelope.droplet)
    }

    fn delete(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/droplets/{}", self.base_url, id))
            .bearer_auth(&self.token)
            .send()?;
        Self::check(response)?;

        Ok(())
    }

    fn ssh_key_ids(&self) -> Result<Vec<u64>> {
        let response = self
            .client
            .get(format!("{}/account/keys", self.base_url))
            .bearer_auth(&self.token)
            .send()?;
        let envelope: SshKeysEnvelope = Self::check(response)?.json()?;

        Ok(envelope.ssh_keys.into_iter().map(|key| key.id).collect())
    }
}

/// How long and how often to poll a fresh droplet for readiness.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        PollPolicy {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_attempts: config.max_poll_attempts,
        }
    }
}

/// Create a droplet and wait until it reports `active`.
///
/// The droplet is created with every SSH key on the account so the operator's
/// key-based login works immediately. Any API failure propagates; there is no
/// retry around individual requests.
pub fn provision(api: &dyn DropletApi, config: &Config, policy: &PollPolicy) -> Result<Droplet> {
    let ssh_keys = api.ssh_key_ids()?;
    if ssh_keys.is_empty() {
        return Err(BountyError::provision_error(
            "no SSH keys registered on the account; droplet would be unreachable",
        ));
    }

    println!("[*] Creating the droplet...");
    let droplet = api.create(&DropletRequest::from_config(config, ssh_keys))?;
    log::info!("created droplet {} ({})", droplet.id, droplet.name);

    println!("[*] Waiting for the droplet to become active...");
    wait_for_active(api, droplet.id, policy)
}

/// Poll the droplet status until it is `active`, up to `max_attempts` polls.
pub fn wait_for_active(api: &dyn DropletApi, id: u64, policy: &PollPolicy) -> Result<Droplet> {
    for attempt in 1..=policy.max_attempts {
        let droplet = api.get(id)?;
        if droplet.is_active() {
            log::info!("droplet {} active after {} poll(s)", id, attempt);
            return Ok(droplet);
        }

        log::debug!(
            "droplet {} status `{}`; poll {}/{}",
            id,
            droplet.status,
            attempt,
            policy.max_attempts
        );
        if attempt < policy.max_attempts {
            println!(
                "[*] Droplet not active yet, sleeping {} seconds...",
                policy.interval.as_secs()
            );
            std::thread::sleep(policy.interval);
        }
    }

    Err(BountyError::provision_error(&format!(
        "droplet {} did not become active after {} polls",
        id, policy.max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Fake provider that serves a scripted sequence of statuses.
    struct ScriptedApi {
        statuses: RefCell<Vec<&'static str>>,
        polls: Cell<u32>,
    }

    impl ScriptedApi {
        fn new(statuses: Vec<&'static str>) -> Self {
            ScriptedApi {
                statuses: RefCell::new(statuses),
                polls: Cell::new(0),
            }
        }

        fn droplet(status: &str) -> Droplet {
            Droplet {
                id: 42,
                name: "recon-droplet".to_string(),
                status: status.to_string(),
                networks: Networks::default(),
            }
        }
    }

    impl DropletApi for ScriptedApi {
        fn create(&self, _request: &DropletRequest) -> Result<Droplet> {
            Ok(Self::droplet("new"))
        }

        fn get(&self, _id: u64) -> Result<Droplet> {
            self.polls.set(self.polls.get() + 1);
            let mut statuses = self.statuses.borrow_mut();
            let status = if statuses.len() > 1 {
                statuses.remove(0)
            } else {
                statuses[0]
            };
            Ok(Self::droplet(status))
        }

        fn delete(&self, _id: u64) -> Result<()> {
            Ok(())
        }

        fn ssh_key_ids(&self) -> Result<Vec<u64>> {
            Ok(vec![7])
        }
    }

    fn instant_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(0),
            max_attempts,
        }
    }

    #[test]
    fn polling_stops_once_active() {
        let api = ScriptedApi::new(vec!["new", "new", "active"]);
        let droplet = wait_for_active(&api, 42, &instant_policy(10)).unwrap();

        assert!(droplet.is_active());
        assert_eq!(api.polls.get(), 3);
    }

    #[test]
    fn polling_is_bounded_when_never_active() {
        let api = ScriptedApi::new(vec!["new"]);
        let error = wait_for_active(&api, 42, &instant_policy(4)).unwrap_err();

        assert!(matches!(error, BountyError::ProvisionError(_)));
        assert_eq!(api.polls.get(), 4);
    }

    #[test]
    fn public_ip_picks_the_public_interface() {
        let droplet = Droplet {
            id: 1,
            name: "d".to_string(),
            status: "active".to_string(),
            networks: Networks {
                v4: vec![
                    NetworkV4 {
                        ip_address: "10.0.0.5".to_string(),
                        kind: "private".to_string(),
                    },
                    NetworkV4 {
                        ip_address: "203.0.113.10".to_string(),
                        kind: "public".to_string(),
                    },
                ],
            },
        };

        assert_eq!(droplet.public_ip(), Some("203.0.113.10"));
    }

    #[test]
    fn droplet_deserializes_from_api_shape() {
        let raw = r#"{
            "droplet": {
                "id": 3164444,
                "name": "recon-droplet",
                "status": "active",
                "networks": {
                    "v4": [
                        {"ip_address": "104.236.32.182", "type": "public", "netmask": "255.255.192.0"}
                    ]
                }
            }
        }"#;
        let envelope: DropletEnvelope = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.droplet.id, 3164444);
        assert_eq!(envelope.droplet.public_ip(), Some("104.236.32.182"));
    }
}
