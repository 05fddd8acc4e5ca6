use clap::Parser;
use log::error;

use building_linker::cli::Cli;
use building_linker::logging::{init_env_logger, init_tracing_from_env, tracing_requested};
use building_linker::orchestrator;
use building_linker::util::envfile::load_dotenv_if_present;

fn main() {
    if let Err(e) = load_dotenv_if_present() {
        eprintln!("Warning: could not read .env: {}", e);
    }

    if tracing_requested() {
        init_tracing_from_env();
    } else {
        init_env_logger();
    }

    let cli = Cli::parse();
    let cfg = match cli.to_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    match orchestrator::run(&cfg) {
        Ok(summary) => {
            println!("{}", summary.stats);
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
