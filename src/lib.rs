//! kclone: clone git repositories into a `host/owner/repo` directory tree
//!
//! The library holds every piece of the workflow so it can be driven by the
//! CLI or by tests with a scripted clone engine and scripted answers.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod progress;
pub mod utils;

pub use error::{Error, Result};
