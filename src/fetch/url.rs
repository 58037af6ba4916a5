//! Repository URL decomposition

use crate::error::UrlError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

/// scp-like SSH form: `git@github.com:owner/repo.git`
static SCP_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9._~-]+@)?([A-Za-z0-9.-]+):([^/].*)$").expect("valid regex")
});

/// Host, owner and repository name extracted from a clone URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub hostname: String,
    pub username: String,
    pub repo_name: String,
}

impl RepoLocation {
    /// `base/hostname/username`
    pub fn owner_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.hostname).join(&self.username)
    }

    /// `base/hostname/username/repo_name`
    pub fn clone_dir(&self, base: &Path) -> PathBuf {
        self.owner_dir(base).join(&self.repo_name)
    }
}

/// Parse a repository URL into its host, owner and repository name.
///
/// The path must contain at least `/owner/repo`; a trailing `.git` is removed
/// from the repository name.
pub fn parse_repo_url(raw: &str) -> Result<RepoLocation, UrlError> {
    let raw = raw.trim();

    let (hostname, path) = if raw.contains("://") {
        let parsed = Url::parse(raw)
            .map_err(|e| UrlError::Unparsable { url: raw.to_string(), reason: e.to_string() })?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UrlError::MissingHost(raw.to_string()))?
            .to_string();
        (host, parsed.path().to_string())
    } else if let Some(caps) = SCP_LIKE.captures(raw) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        return Err(UrlError::Unparsable {
            url: raw.to_string(),
            reason: "expected scheme://host/owner/repo or user@host:owner/repo".to_string(),
        });
    };

    let mut segments = path.trim_matches('/').split('/');
    let username = segments.next().unwrap_or_default();
    let repo_segment = segments.next().unwrap_or_default();
    let repo_name = repo_segment.strip_suffix(".git").unwrap_or(repo_segment);

    if username.is_empty() || repo_name.is_empty() {
        return Err(UrlError::MissingSegments(raw.to_string()));
    }

    Ok(RepoLocation {
        hostname,
        username: username.to_string(),
        repo_name: repo_name.to_string(),
    })
}
