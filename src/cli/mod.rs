//! CLI module: clap-based argument parsing into an [`AppConfig`](crate::config::AppConfig).

mod clap_parser;

pub use clap_parser::{Cli, FormatOpt};
