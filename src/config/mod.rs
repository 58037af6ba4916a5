//! Configuration persistence
//!
//! A single JSON document at `<home>/.kclone_config.json` holds the default
//! clone directory. The home directory is resolved once at startup and passed
//! to the store explicitly.

pub mod store;

pub use store::{expand_user, resolve_home, Config, ConfigStore, CONFIG_FILE_NAME};
