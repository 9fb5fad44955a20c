use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sfbridge")]
#[command(about = "Sync bridge between a local relational store and Salesforce")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./sfbridge.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter configuration file
    Init {
        /// Target path (defaults to ./sfbridge.toml)
        path: Option<PathBuf>,
    },

    /// Generate a model skeleton from a Salesforce object description
    #[command(after_help = "Examples:\n  \
        sfbridge model Account               Generate a model for Account\n  \
        sfbridge model Custom_Object__c      Works for custom objects too")]
    Model {
        /// Salesforce object (table) name
        object: String,
    },
}
