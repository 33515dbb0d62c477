//! Command-line front end for `docqa-rag`.
//!
//! `docqa ingest` indexes a directory of documents; `docqa query` answers a
//! question from that index and lists the snippets it was grounded on.

pub mod cli;
pub mod commands;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use commands::run;
