mod cli;
mod config;
mod conversion;
mod csv_source;
mod error;
mod gocardless;
mod models;
mod routine;
mod saltedge;
mod settings;
mod specifics;
mod status_store;
mod storage;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            config,
            file,
            identifier,
        } => cli::convert::run(&config, file.as_deref(), identifier),
        Commands::Status { identifier } => cli::status::run(identifier.as_deref()),
        Commands::Auto { directory } => cli::auto::run(directory.as_deref()),
        Commands::Link { config } => cli::link::run(&config),
        Commands::Jobs => cli::jobs::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
