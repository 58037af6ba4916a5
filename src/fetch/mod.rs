//! Repository fetching: URL decomposition and the clone engine

pub mod engine;
pub mod signals;
pub mod url;

pub use engine::{CloneEngine, Git2Engine};
pub use url::{parse_repo_url, RepoLocation};
