//! Dedup-aware local SQLite store.
//!
//! One store file per workspace. A host's primary record is keyed by its IP
//! address: the first hostname observed for an IP becomes the host record,
//! later hostnames on the same IP become alt-host records under it, and
//! repeated (hostname, IP) observations count as duplicates. Alt-hosts are
//! owned by their host row and go away with it.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::import::{Disposition, HostRow, RecordSink};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS hosts (
    id INTEGER PRIMARY KEY,
    host TEXT NOT NULL,
    ip_address TEXT NOT NULL,
    source TEXT,
    workspace TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS hosts_ip_address ON hosts (ip_address);

CREATE TABLE IF NOT EXISTS althosts (
    id INTEGER PRIMARY KEY,
    hostname TEXT NOT NULL,
    source TEXT,
    host_id INTEGER NOT NULL REFERENCES hosts (id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS althosts_host_id ON althosts (host_id);
";

/// SQLite-backed `RecordSink` with host/alt-host dedup.
pub struct SqliteSink {
    connection: Connection,
}

impl SqliteSink {
    /// Open (and if needed create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        connection.execute_batch(SCHEMA)?;

        Ok(SqliteSink { connection })
    }

    /// The first host record carrying `ip_address`, if any.
    fn host_for_ip(&self, ip_address: &str) -> Result<Option<(i64, String)>> {
        let found = self
            .connection
            .query_row(
                "SELECT id, host FROM hosts WHERE ip_address = ?1 ORDER BY id LIMIT 1",
                params![ip_address],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(found)
    }

    fn alt_host_exists(&self, host_id: i64, hostname: &str) -> Result<bool> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM althosts WHERE host_id = ?1 AND hostname = ?2",
            params![host_id, hostname],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

impl RecordSink for SqliteSink {
    /// Insert-or-classify one row. Each insert commits on its own, so an
    /// interrupted import leaves a consistent prefix of the result file.
    fn absorb(&mut self, row: &HostRow, workspace: &str) -> Result<Disposition> {
        match self.host_for_ip(&row.ip_address)? {
            None => {
                self.connection.execute(
                    "INSERT INTO hosts (host, ip_address, source, workspace)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![row.hostname, row.ip_address, row.source, workspace],
                )?;
                Ok(Disposition::NewHost)
            }
            Some((host_id, primary_hostname)) => {
                if primary_hostname == row.hostname
                    || self.alt_host_exists(host_id, &row.hostname)?
                {
                    return Ok(Disposition::Duplicate);
                }

                self.connection.execute(
                    "INSERT INTO althosts (hostname, source, host_id) VALUES (?1, ?2, ?3)",
                    params![row.hostname, row.source, host_id],
                )?;
                Ok(Disposition::NewAltHost)
            }
        }
    }
}
