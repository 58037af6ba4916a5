//! Destination directory conflict resolution
//!
//! A clone target that is missing or empty is used as-is. A non-empty one is
//! overwritten, renamed or the clone is cancelled, as decided by a
//! [`DecisionProvider`].

pub mod prompt;
pub mod remove;

pub use prompt::{DecisionProvider, FixedDecision, ScriptedDecisions, TerminalPrompter};
pub use remove::{Remover, SafeRemover, SystemRemover};

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CHOICE_PROMPT: &str = "Choose an action:";
pub const CHOICE_OPTIONS: [&str; 3] = ["[O]verwrite", "[R]ename", "[C]ancel"];
pub const RENAME_PROMPT: &str = "Enter a new directory name:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Overwrite,
    Rename,
    Cancel,
}

impl Choice {
    /// Anything unrecognized cancels.
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "o" | "overwrite" => Choice::Overwrite,
            "r" | "rename" => Choice::Rename,
            _ => Choice::Cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Clone into this path
    Proceed(PathBuf),
    Cancelled,
}

pub struct ConflictResolver<R = SystemRemover> {
    remover: SafeRemover<R>,
}

impl ConflictResolver<SystemRemover> {
    pub fn new() -> Self {
        Self::with_remover(SafeRemover::new())
    }
}

impl Default for ConflictResolver<SystemRemover> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Remover> ConflictResolver<R> {
    pub fn with_remover(remover: SafeRemover<R>) -> Self {
        Self { remover }
    }

    /// Decide where to clone given the intended `clone_path`.
    ///
    /// A renamed target is checked again, so the user is asked once more if
    /// the new name is also taken.
    pub fn resolve(
        &self,
        clone_path: &Path,
        decisions: &mut dyn DecisionProvider,
    ) -> Result<Resolution> {
        let mut target = clone_path.to_path_buf();

        loop {
            if !is_occupied(&target)? {
                return Ok(Resolution::Proceed(target));
            }

            println!("Target directory '{}' already exists and is not empty.", target.display());
            let answer = decisions.ask_choice(CHOICE_PROMPT, &CHOICE_OPTIONS)?;

            match Choice::parse(&answer) {
                Choice::Overwrite => {
                    let attempts = self.remover.remove(&target)?;
                    tracing::debug!("Removed {} after {} attempt(s)", target.display(), attempts);
                    return Ok(Resolution::Proceed(target));
                }
                Choice::Rename => {
                    let answer = decisions.ask_text(RENAME_PROMPT)?;
                    let name = answer.trim();
                    if name.is_empty() {
                        println!("Operation cancelled.");
                        return Ok(Resolution::Cancelled);
                    }
                    validate_dir_name(name)?;

                    target = match target.parent() {
                        Some(parent) => parent.join(name),
                        None => PathBuf::from(name),
                    };
                    tracing::debug!("Renamed clone target to {}", target.display());
                }
                Choice::Cancel => {
                    println!("Operation cancelled.");
                    return Ok(Resolution::Cancelled);
                }
            }
        }
    }
}

/// True when `path` exists and is a non-empty directory or a non-directory.
fn is_occupied(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
        Ok(meta) if meta.is_dir() => Ok(fs::read_dir(path)?.next().is_some()),
        Ok(_) => Ok(true),
    }
}

fn validate_dir_name(name: &str) -> Result<()> {
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
