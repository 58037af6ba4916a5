//! Error types for kclone operations

use std::path::PathBuf;

/// Errors raised while loading or saving the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home directory could be determined
    #[error("could not determine the user's home directory")]
    NoHome,

    #[error("failed reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed writing config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while decomposing a repository URL
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("invalid repository URL '{url}': {reason}")]
    Unparsable { url: String, reason: String },

    #[error("repository URL '{0}' has no host")]
    MissingHost(String),

    #[error("repository URL '{0}' must contain /owner/repo")]
    MissingSegments(String),
}

/// Errors raised by the safe directory removal
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("unable to delete {path} after {attempts} attempts: {source}")]
    Exhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to delete {path}: {source}")]
    Failed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by the clone engine
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("{0}")]
    Git(#[from] git2::Error),

    #[error("submodule '{name}': {source}")]
    Submodule {
        name: String,
        #[source]
        source: git2::Error,
    },
}

/// Top-level error for a kclone invocation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error("invalid directory name '{0}'")]
    InvalidName(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to clone repository: {0}")]
    Clone(#[from] CloneError),
}

impl Error {
    /// Process exit code for this failure class
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Clone(_) => 1,
            Error::Config(_) => 3,
            Error::Url(_) | Error::InvalidName(_) => 4,
            Error::Delete(_) | Error::Io(_) | Error::Prompt(_) => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_failure_classes() {
        let url = Error::from(UrlError::MissingSegments("https://h/x".to_string()));
        let config = Error::from(ConfigError::NoHome);
        let clone = Error::from(CloneError::Git(git2::Error::from_str("network down")));

        assert_eq!(url.exit_code(), 4);
        assert_eq!(config.exit_code(), 3);
        assert_eq!(clone.exit_code(), 1);
        assert!(clone.to_string().contains("network down"));
    }
}
