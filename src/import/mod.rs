//! Result import.
//!
//! Reads the downloaded recon-ng result database and merges every row of its
//! `hosts` table into a target store. The target is abstracted as a
//! `RecordSink`: the SQLite store deduplicates against existing host and
//! alt-host records, the Elasticsearch sink appends every row. The importer
//! itself only iterates, classifies via the sink, and tallies.

pub mod elastic;
pub mod store;

use std::io::Write;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{BountyError, Result};

/// One row of the recon-ng `hosts` table.
///
/// recon-ng's schema puts the hostname at column 0, the IP at column 1 and
/// the discovering module at column 6; the columns in between (geo data) are
/// not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRow {
    pub hostname: String,
    pub ip_address: String,
    pub source: String,
}

/// How a sink classified one absorbed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    NewHost,
    NewAltHost,
    Duplicate,
}

/// Tallies for one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub new_hosts: u64,
    pub new_alt_hosts: u64,
    pub duplicates: u64,
}

impl ImportStats {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::NewHost => self.new_hosts += 1,
            Disposition::NewAltHost => self.new_alt_hosts += 1,
            Disposition::Duplicate => self.duplicates += 1,
        }
    }
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new hosts, {} new alt hosts, {} duplicates",
            self.new_hosts, self.new_alt_hosts, self.duplicates
        )
    }
}

/// A destination for imported host rows.
pub trait RecordSink {
    /// Merge one row into the target store and report how it was classified.
    fn absorb(&mut self, row: &HostRow, workspace: &str) -> Result<Disposition>;
}

/// Import every host row of `db_path` into `sink`.
///
/// The result file is opened read-only; a missing or malformed file is fatal
/// to the import step. Rows without an IP address are skipped (the remote
/// cleanup should already have pruned them). An empty `hosts` table yields
/// zeroed stats without error.
pub fn import(db_path: &Path, workspace: &str, sink: &mut dyn RecordSink) -> Result<ImportStats> {
    let connection = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|error| {
        BountyError::import_error(&format!(
            "cannot open result file {}: {}",
            db_path.display(),
            error
        ))
    })?;

    println!("[*] Pulling data from the recon-ng db...");
    let mut statement = connection.prepare("SELECT * FROM hosts")?;
    let rows = statement.query_map([], |row| {
        Ok(HostRow {
            hostname: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            ip_address: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            source: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    })?;

    let mut stats = ImportStats::default();
    for row in rows {
        let row = row?;
        if row.ip_address.is_empty() {
            log::debug!("skipping {} without an IP address", row.hostname);
            continue;
        }

        stats.record(sink.absorb(&row, workspace)?);
        print!("\r[*] {}", stats);
        let _ = std::io::stdout().flush();
    }

    println!("\r[*] {}", stats);
    Ok(stats)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::import::store::SqliteSink;
    use tempfile::TempDir;

    /// recon-ng's hosts table layout, trimmed to the columns that matter plus
    /// the geo padding so `source` lands at column 6.
    pub(crate) fn write_result_file(
        dir: &TempDir,
        name: &str,
        rows: &[(&str, Option<&str>, &str)],
    ) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let connection = Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE hosts (
                    host TEXT,
                    ip_address TEXT,
                    region TEXT,
                    country TEXT,
                    latitude TEXT,
                    longitude TEXT,
                    module TEXT
                );",
            )
            .unwrap();
        for (host, ip, source) in rows {
            connection
                .execute(
                    "INSERT INTO hosts (host, ip_address, module) VALUES (?1, ?2, ?3)",
                    rusqlite::params![host, ip, source],
                )
                .unwrap();
        }
        path
    }

    #[test]
    fn mixed_rows_classify_as_host_alt_host_and_duplicate() {
        let dir = TempDir::new().unwrap();
        let result_file = write_result_file(
            &dir,
            "acme.db",
            &[
                ("a.example.com", Some("1.2.3.4"), "src1"),
                ("b.example.com", Some("1.2.3.4"), "src1"),
                ("a.example.com", Some("1.2.3.4"), "src1"),
            ],
        );
        let mut sink = SqliteSink::open(&dir.path().join("store.db")).unwrap();

        let stats = import(&result_file, "acme", &mut sink).unwrap();

        assert_eq!(
            stats,
            ImportStats {
                new_hosts: 1,
                new_alt_hosts: 1,
                duplicates: 1,
            }
        );
    }

    #[test]
    fn empty_result_file_imports_cleanly() {
        let dir = TempDir::new().unwrap();
        let result_file = write_result_file(&dir, "empty.db", &[]);
        let mut sink = SqliteSink::open(&dir.path().join("store.db")).unwrap();

        let stats = import(&result_file, "acme", &mut sink).unwrap();

        assert_eq!(stats, ImportStats::default());
    }

    #[test]
    fn reimport_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let result_file = write_result_file(
            &dir,
            "acme.db",
            &[
                ("a.example.com", Some("1.2.3.4"), "src1"),
                ("b.example.com", Some("1.2.3.4"), "src1"),
                ("c.example.com", Some("5.6.7.8"), "src2"),
            ],
        );
        let mut sink = SqliteSink::open(&dir.path().join("store.db")).unwrap();

        let first = import(&result_file, "acme", &mut sink).unwrap();
        assert_eq!(first.new_hosts, 2);
        assert_eq!(first.new_alt_hosts, 1);
        assert_eq!(first.duplicates, 0);

        let second = import(&result_file, "acme", &mut sink).unwrap();
        assert_eq!(second.new_hosts, 0);
        assert_eq!(second.new_alt_hosts, 0);
        assert_eq!(second.duplicates, 3);
    }

    #[test]
    fn rows_without_an_ip_are_skipped() {
        let dir = TempDir::new().unwrap();
        let result_file = write_result_file(
            &dir,
            "acme.db",
            &[
                ("a.example.com", None, "src1"),
                ("b.example.com", Some("1.2.3.4"), "src1"),
            ],
        );
        let mut sink = SqliteSink::open(&dir.path().join("store.db")).unwrap();

        let stats = import(&result_file, "acme", &mut sink).unwrap();

        assert_eq!(stats.new_hosts, 1);
        assert_eq!(stats.new_alt_hosts, 0);
        assert_eq!(stats.duplicates, 0);
    }

    #[test]
    fn missing_result_file_is_an_import_error() {
        let dir = TempDir::new().unwrap();
        let mut sink = SqliteSink::open(&dir.path().join("store.db")).unwrap();

        let error = import(&dir.path().join("missing.db"), "acme", &mut sink).unwrap_err();
        assert!(matches!(error, BountyError::ImportError(_)));
    }
}
