pub mod address;
pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod prepare;
pub mod util;
