// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vestibule - a guided-intake conversation service.
//!
//! Binary entry point.

use clap::{Parser, Subcommand};

mod serve;

/// Vestibule - a guided-intake conversation service.
#[derive(Parser, Debug)]
#[command(name = "vestibule", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the intake HTTP server.
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match vestibule_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            vestibule_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("vestibule serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("vestibule config: failed to render: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("vestibule: use --help for available commands");
        }
    }
}
