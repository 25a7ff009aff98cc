//! Library for the `bounty` recon orchestration tool.
//!
//! This crate provides the pieces used by the `bounty` binary:
//! - The `commands` module contains the CLI flag surface and wiring to execute
//!   the different pipeline modes (VM setup, recon runs, result imports).
//! - The `cloud` module talks to the DigitalOcean API to create, inspect and
//!   destroy droplets, and waits for freshly created droplets to become active.
//! - The `remote` module executes commands over SSH and retrieves files over
//!   SFTP from a droplet.
//! - The `recon` module drives the recon-ng CLI on the droplet: adding target
//!   domains, executing the discovery modules, and pruning unreachable hosts.
//! - The `import` module merges a downloaded recon-ng result database into a
//!   local SQLite store (with host/alt-host dedup) or an Elasticsearch index.
//! - The `config` module loads the sectioned key/value configuration file.
//! - The `error` module defines error types used across the library.
//!
//! The library exposes a small `CommandHandler` trait which CLI types implement
//! to perform their respective operation when invoked by the CLI entrypoint.
//!
//! Design notes:
//! - Everything is sequential and blocking: each remote command, file transfer
//!   and database operation completes before the next one starts.
//! - Ownership is preferred for command handlers: `handle(self)` consumes the
//!   command struct so implementations can move resources (configuration,
//!   clients, sessions) without cloning.
pub mod cloud;
pub mod commands;
pub mod config;
pub mod error;
pub mod import;
pub mod recon;
pub mod remote;

/// A thin abstraction implemented by CLI command structs to execute work.
///
/// Implementors should perform whatever IO/networking or processing the command
/// represents inside `handle`. The method takes ownership of `self` so
/// implementors can move owned fields (configuration, clients, sessions)
/// without requiring extra cloning.
pub trait CommandHandler {
    /// Execute the command, consuming the implementor.
    fn handle(self) -> crate::error::Result<()>;
}
