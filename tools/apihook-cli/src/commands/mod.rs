//! CLI command implementations.

pub mod config;
pub mod request;

use apihook_sdk::prelude::Method;
use clap::{Args, Subcommand};

/// Arguments for the request command.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Endpoint appended to the base URL.
    pub endpoint: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// JSON body, or @path to read it from a file.
    #[arg(short = 'd', long)]
    pub body: Option<String>,

    /// Extra header as `name:value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Attach the bearer token.
    #[arg(long)]
    pub auth: bool,

    /// Bearer token (overrides config).
    #[arg(long)]
    pub token: Option<String>,

    /// Base URL (overrides config).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip repeats inside this window, in milliseconds.
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Number of times to fetch.
    #[arg(long, default_value = "1")]
    pub repeat: usize,

    /// Do not transition to loading before each call.
    #[arg(long)]
    pub no_loader: bool,

    /// Handle these status codes with a custom action, e.g. `429,503`. Repeatable.
    #[arg(long = "intercept")]
    pub intercepts: Vec<String>,

    /// JSON pointer into the response stored as data, e.g. `/data/items`.
    #[arg(long)]
    pub select: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Base URL to seed the store with.
        #[arg(long, default_value = "http://localhost:8080")]
        base_url: String,

        /// Write JSON instead of TOML.
        #[arg(long)]
        json: bool,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
