use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hk_core::OutputFormat;

#[derive(Parser)]
#[command(name = "homekeep", version)]
#[command(about = "Household shopping list and pool sensor logger")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/homekeep/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server and the pool poller until Ctrl-C
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Listen port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Do not poll the pool sensor
        #[arg(long)]
        no_poller: bool,
    },

    /// Add items to the shopping list ("Milch und Eier" adds two)
    Add {
        /// Free-form note text
        text: String,

        /// Who or what captured the note
        #[arg(short, long)]
        source: String,
    },

    /// Show the shopping list, newest first
    List,

    /// Remove one entry by id
    Delete {
        /// Entry id (ULID)
        id: String,
    },

    /// Remove every entry
    Clear,

    /// Show logged pool readings, oldest first
    PoolLog {
        /// Only the most recent N readings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Poll the pool sensor once and log the reading
    PollOnce,

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a commented default config file
    Init,

    /// Print the effective configuration
    Show,
}
