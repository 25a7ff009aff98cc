//! CLI command definitions and dispatch.

pub mod base;
pub mod import;
pub mod recon;
pub mod setup;
