//! Append-only Elasticsearch sink.
//!
//! Indexes every imported row as a `host` document, with no dedup: the index
//! is a searchable log of observations, not the canonical store. The client
//! is constructed explicitly from configuration and lives only as long as the
//! import command.
//!
//! The index keeps the legacy one-mapping-per-document-kind layout
//! (`/<index>/<doc_type>`) for compatibility with the pre-7.x cluster the
//! original deployment targeted. The `shodan_port` and `shodan_metadata`
//! kinds are mapped at bootstrap so enrichment jobs can write them later.

use chrono::Utc;
use serde_json::json;

use crate::error::{BountyError, Result};
use crate::import::{Disposition, HostRow, RecordSink};

/// Elasticsearch-backed `RecordSink`.
pub struct ElasticSink {
    client: reqwest::blocking::Client,
    base_url: String,
    index: String,
}

impl ElasticSink {
    pub fn new(base_url: &str, index: &str) -> Self {
        ElasticSink {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }

    /// Create the index with its three document mappings if it does not exist
    /// yet.
    pub fn ensure_index(&self) -> Result<()> {
        let index_url = format!("{}/{}", self.base_url, self.index);
        let head = self.client.head(&index_url).send()?;
        if head.status().is_success() {
            log::debug!("index {} already exists", self.index);
            return Ok(());
        }

        println!("[*] Creating the {} index...", self.index);
        check(self.client.put(&index_url).send()?)?;

        for (doc_type, mapping) in [
            ("host", host_mapping()),
            ("shodan_port", shodan_port_mapping()),
            ("shodan_metadata", shodan_metadata_mapping()),
        ] {
            let mapping_url = format!("{}/_mapping/{}", index_url, doc_type);
            check(self.client.put(&mapping_url).json(&mapping).send()?)?;
        }

        Ok(())
    }
}

impl RecordSink for ElasticSink {
    /// Index the row unconditionally; every absorbed row is a new document.
    fn absorb(&mut self, row: &HostRow, workspace: &str) -> Result<Disposition> {
        let body = json!({
            "ip_address": row.ip_address,
            "hostname": row.hostname,
            "source": row.source,
            "workspace": workspace,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let url = format!("{}/{}/host", self.base_url, self.index);
        check(self.client.post(&url).json(&body).send()?)?;

        Ok(Disposition::NewHost)
    }
}

fn check(response: reqwest::blocking::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().unwrap_or_default();
    Err(BountyError::api_error(status.as_u16(), &body))
}

fn host_mapping() -> serde_json::Value {
    json!({
        "host": {
            "properties": {
                "ip_address": {"type": "string"},
                "source": {"type": "string"},
                "workspace": {"type": "string"},
                "hostname": {"type": "string", "index": "not_analyzed"},
                "timestamp": {"type": "date"},
            }
        }
    })
}

fn shodan_port_mapping() -> serde_json::Value {
    json!({
        "shodan_port": {
            "properties": {
                "ip_address": {"type": "string"},
                "source": {"type": "string"},
                "workspace": {"type": "string"},
                "hostname": {"type": "string", "index": "not_analyzed"},
                "port": {"type": "integer"},
                "timestamp": {"type": "date"},
            }
        }
    })
}

fn shodan_metadata_mapping() -> serde_json::Value {
    json!({
        "shodan_metadata": {
            "properties": {
                "ip_address": {"type": "string"},
                "source": {"type": "string"},
                "workspace": {"type": "string"},
                "hostname": {"type": "string", "index": "not_analyzed"},
                "timestamp": {"type": "date"},
            }
        }
    })
}
