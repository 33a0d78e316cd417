//! sitekit command-line interface
//!
//! Loads configuration, builds the fetch client and store registry, and runs
//! one command against a live site.

pub mod commands;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;
pub mod router;

pub use context::AppContext;
pub use error::{CliError, CliResult};
pub use router::{Cli, CommandRouter, Commands};
