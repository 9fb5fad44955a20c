//! sfb - a Salesforce sync bridge library.
//!
//! This crate provides the machinery behind the `sfbridge` CLI and the
//! library surface applications embed: declare a [`sfb_core::RecordSchema`]
//! per model, implement [`SyncStore`] over your tables, and drive
//! [`Syncer`] to push and pull.
//!
//! # Main Components
//!
//! - [`Connection`] - authenticated Salesforce context (OAuth2 password flow)
//! - [`client`] - per-object REST client, bulk jobs, reconnect-on-expiry
//! - [`Syncer`] - push / pull / pull_all reconciliation over a [`SyncStore`]
//! - [`FilesClient`] - file uploads and record attachments
//! - [`BridgeConfig`] - TOML configuration with an offline switch
//!
//! # Getting a connection
//!
//! ```rust,ignore
//! use sfb::{BridgeConfig, Connection, Syncer};
//!
//! let config = BridgeConfig::load(Path::new("sfbridge.toml"))?;
//! let conn = Connection::open(config)?;
//! let syncer = Syncer::new(&conn, &store);
//! syncer.pull_all(None, None, true)?;
//! ```

mod cli;
mod commands;

pub mod client;
pub mod config;
pub mod error;
pub mod files;
pub mod store;
pub mod sync;

pub use cli::{Cli, Command};
pub use client::{BulkClient, Connection, ObjectClient, Session};
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use files::{FileHandle, FilesClient};
pub use store::{sync_columns_ddl, SyncStore};
pub use sync::{PullAllReport, PushOutcome, SerializeOptions, Syncer};

/// Execute a CLI invocation. This is the entry point for the binary and
/// a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config;
    match cli.command {
        Command::Init { path } => {
            let target = path.unwrap_or_else(|| commands::config_path(config.as_deref()));
            commands::init::run(&target)
        }
        Command::Model { object } => commands::model::run(config.as_deref(), &object),
    }
}
