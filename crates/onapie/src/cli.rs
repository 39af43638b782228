//! Clap derive structure for the `onapie` CLI.
//!
//! Clap only handles the binary's own flags. Everything from the first
//! other token on is passed through untouched: client options, the API name,
//! the method name and the method options.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};

use crate::commands;

/// onapie -- command-line client for the Ona forms and data API
#[derive(Debug, Parser)]
#[command(
    name = "onapie",
    version,
    about = "Call the Ona forms and data API from the command line",
    long_about = "Call the Ona forms and data API from the command line.\n\n\
        Client options are read from ~/.onapierc (JSON), then ONAPIE_* environment \
        variables, then the command line.",
    override_usage = "onapie [-v...] [-q] [--config <PATH>] [--<client-option> <value>]... \
        <API> <METHOD> [--<method-option> <value>]...",
    disable_help_flag = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Print nothing but warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// JSON configuration file (default ~/.onapierc)
    #[arg(long, env = "ONAPIE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Client options, the API and method names, then method options
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub args: Vec<String>,
}

const CLIENT_OPTIONS: &str = "Client options:
  --api-addr <url>         Server address (default https://api.ona.io)
  --token-key <token>      Pre-issued API token (alias --api-token)
  --username <name>        Username exchanged with --password for a token
  --password <secret>
  --api-entrypoint <path>  API root (default /api/v1)
  --auth-path <path>       Token exchange path under the API root (default /user)
  --fetch-catalog <bool>   Discover resource paths from the API root (default True)
  --timeout <seconds>      Connect timeout (default 20)
  --read-timeout <seconds> Read timeout (default 20)
  --ssl-verify <bool>      Verify TLS certificates (default True)
  --ca-cert <path>         Extra CA certificate (PEM) to trust
  --max-retries <n>        Retries for failed connections (default 5)
  --user-agent <text>
  --output <format>        json, json-compact, yaml or plain (default json)

Examples:
  onapie --username=jane --password=secret forms list
  onapie forms get --pk 12 --representation xml
  onapie data get --pk 12 --age 5";

/// `-h` / `--help` anywhere on the command line.
pub fn help_requested(args: &[String]) -> bool {
    args.iter().any(|arg| arg == "-h" || arg == "--help")
}

/// Long help with the client options and the registry listing.
pub fn long_help() -> String {
    Cli::command()
        .after_long_help(format!("{CLIENT_OPTIONS}\n\n{}", commands::listing()))
        .render_long_help()
        .to_string()
}
