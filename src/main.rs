use clap::Parser;
use std::io;
use std::process::ExitCode;

use telnet_bridge::cli::Cli;
use telnet_bridge::client;
use telnet_bridge::config::ClientConfig;
use telnet_bridge::logging;

fn main() -> ExitCode {
    let config = match ClientConfig::try_from(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let mut stdout = io::stdout();
    if let Err(e) = client::write_banner(&mut stdout, &config) {
        tracing::warn!(error = %e, "could not write banner");
    }

    let outcome = client::run(&config);
    if let Err(e) = client::write_outcome(&mut stdout, &outcome) {
        tracing::warn!(error = %e, "could not write closing notice");
    }

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
