mod cli;
mod commands;
mod dispatch;
mod error;
mod execute;
mod options;
mod output;

use std::collections::VecDeque;
use std::io::IsTerminal;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use onapie_api::Client;

use crate::cli::Cli;
use crate::dispatch::{Stage, join};
use crate::error::{CliError, exit_code};

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if cli::help_requested(&raw) {
        print!("{}", cli::long_help());
        std::process::exit(exit_code::SUCCESS);
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(&cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = match (quiet, verbosity) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut tokens: VecDeque<String> = cli.args.iter().cloned().collect();

    let client_options = options::parse(&mut tokens)?;
    let unknown: Vec<&str> = client_options
        .keys()
        .map(String::as_str)
        .filter(|name| !onapie_config::KEYS.contains(name))
        .collect();
    if !unknown.is_empty() {
        warn!("ignoring unknown client option(s): {}", join(&unknown, "and"));
    }
    let settings = onapie_config::load(cli.config.as_deref(), &client_options)?;

    // API and method resolve before the client connects.
    let api = dispatch::resolve(commands::APIS, &mut tokens, Stage::Api)?;
    let operation = dispatch::resolve(api.operations, &mut tokens, Stage::Method { api: api.name })?;

    let client = Client::new(settings.client_config()?).map_err(CliError::client)?;
    debug!(api = api.name, method = operation.name, "dispatching");
    let result = execute::execute(&client, operation, &mut tokens)?;

    output::print_output(&result, settings.output, cli.quiet)
}
