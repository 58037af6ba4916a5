//! The clone workflow: URL → directory tree → conflict check → clone

use crate::conflict::{ConflictResolver, DecisionProvider, Remover, Resolution, SystemRemover};
use crate::error::Result;
use crate::fetch::{parse_repo_url, CloneEngine};
use crate::progress::ProgressListener;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Repository cloned into this path
    Cloned(PathBuf),
    Cancelled,
}

pub struct Cloner<E, R = SystemRemover> {
    engine: E,
    resolver: ConflictResolver<R>,
    base_dir: PathBuf,
}

impl<E: CloneEngine> Cloner<E, SystemRemover> {
    pub fn new(engine: E, base_dir: impl Into<PathBuf>) -> Self {
        Self::with_resolver(engine, base_dir, ConflictResolver::new())
    }
}

impl<E: CloneEngine, R: Remover> Cloner<E, R> {
    pub fn with_resolver(
        engine: E,
        base_dir: impl Into<PathBuf>,
        resolver: ConflictResolver<R>,
    ) -> Self {
        Self { engine, resolver, base_dir: base_dir.into() }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Clone `url` into `base_dir/host/owner/repo`.
    ///
    /// The owner directory is created before the conflict check; a cancelled
    /// run leaves it in place.
    pub fn run(
        &self,
        url: &str,
        decisions: &mut dyn DecisionProvider,
        listener: &mut dyn ProgressListener,
    ) -> Result<CloneOutcome> {
        let location = parse_repo_url(url)?;

        let owner_dir = location.owner_dir(&self.base_dir);
        fs::create_dir_all(&owner_dir)?;

        let clone_path = owner_dir.join(&location.repo_name);
        tracing::debug!("Clone target: {}", clone_path.display());

        let clone_path = match self.resolver.resolve(&clone_path, decisions)? {
            Resolution::Proceed(path) => path,
            Resolution::Cancelled => return Ok(CloneOutcome::Cancelled),
        };

        self.engine.clone_repo(url, &clone_path, listener)?;
        tracing::info!("Cloned {} into {}", url, clone_path.display());

        Ok(CloneOutcome::Cloned(clone_path))
    }
}

/// Command used to open a directory in the platform file manager
pub fn explorer_command() -> &'static str {
    if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Lines printed after a successful clone
pub fn success_message(path: &Path) -> String {
    let path = path.display();
    format!(
        "Repository cloned to {path}\n\n    {:<8} {path}\n    {:<8} {path}\n",
        explorer_command(),
        "code"
    )
}
