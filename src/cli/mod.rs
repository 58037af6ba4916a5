//! Command-line interface for kclone
//!
//! `kclone <url>` clones into the organized tree, `kclone` alone prints the
//! default directory and `--set-default` changes it.

use anyhow::Result;
use clap::builder::ArgPredicate;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{expand_user, resolve_home, ConfigStore};
use crate::conflict::{DecisionProvider, FixedDecision, TerminalPrompter};
use crate::error::Error;
use crate::fetch::Git2Engine;
use crate::orchestrator::{success_message, CloneOutcome, Cloner};
use crate::progress::ProgressReporter;

/// Clone git repositories into an organized host/owner/repo directory tree
#[derive(Parser)]
#[command(name = "kclone")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository URL to clone; prints the default clone directory when omitted
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Base clone directory for this invocation only
    #[arg(short = 'd', long, value_name = "PATH", env = "KCLONE_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Persist a new default clone directory and exit
    #[arg(long, value_name = "PATH")]
    pub set_default: Option<String>,

    /// How to handle a non-empty target directory
    #[arg(
        long,
        value_enum,
        value_name = "ACTION",
        default_value_t = ConflictPolicy::Prompt,
        default_value_if("rename_to", ArgPredicate::IsPresent, "rename")
    )]
    pub on_conflict: ConflictPolicy,

    /// New directory name used with `--on-conflict rename` (implies it)
    #[arg(long, value_name = "NAME", required_if_eq("on_conflict", "rename"))]
    pub rename_to: Option<String>,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    /// Ask on the terminal
    Prompt,
    Overwrite,
    Rename,
    Cancel,
}

impl Cli {
    /// Reject flag combinations clap cannot express on its own.
    pub fn validate(&self) -> std::result::Result<(), clap::Error> {
        if self.rename_to.is_some() && self.on_conflict != ConflictPolicy::Rename {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--rename-to can only be used with --on-conflict rename",
            ));
        }
        Ok(())
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = cli.validate() {
        err.exit();
    }

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>().map_or(1, Error::exit_code)
}

fn execute(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "kclone", &mut std::io::stdout());
        return Ok(());
    }

    let home = resolve_home().map_err(Error::from)?;
    let store = ConfigStore::for_home(&home);
    let mut config = store.load().map_err(Error::from)?;

    if let Some(path) = cli.set_default {
        config.default_clone_dir = expand_user(&path, &home).map_err(Error::from)?;
        store.save(&config).map_err(Error::from)?;
        println!("Default clone directory set to: {}", config.default_clone_dir.display());
        return Ok(());
    }

    let Some(url) = cli.url else {
        println!("Current default clone directory: {}", config.default_clone_dir.display());
        return Ok(());
    };

    let base_dir = cli.directory.unwrap_or(config.default_clone_dir);
    let mut decisions = decision_provider(cli.on_conflict, cli.rename_to);
    let cloner = Cloner::new(Git2Engine::new(), base_dir);

    let outcome = {
        let mut reporter = ProgressReporter::new();
        cloner.run(&url, decisions.as_mut(), &mut reporter)?
    };

    if let CloneOutcome::Cloned(path) = outcome {
        println!("{}", success_message(&path));
    }
    Ok(())
}

fn decision_provider(
    policy: ConflictPolicy,
    rename_to: Option<String>,
) -> Box<dyn DecisionProvider> {
    match policy {
        ConflictPolicy::Prompt => Box::new(TerminalPrompter),
        ConflictPolicy::Overwrite => Box::new(FixedDecision::overwrite()),
        ConflictPolicy::Rename => Box::new(FixedDecision::rename(rename_to.unwrap_or_default())),
        ConflictPolicy::Cancel => Box::new(FixedDecision::cancel()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rename_policy_requires_a_name() {
        let missing_name = Cli::try_parse_from(["kclone", "--on-conflict", "rename", "https://h/o/r"]);
        assert!(missing_name.is_err());
        let cli = Cli::try_parse_from([
            "kclone",
            "--on-conflict",
            "rename",
            "--rename-to",
            "fork",
            "https://h/o/r",
        ])
        .expect("parse");
        assert_eq!(cli.on_conflict, ConflictPolicy::Rename);
        assert_eq!(cli.rename_to.as_deref(), Some("fork"));
    }

    #[test]
    fn rename_to_alone_implies_rename_policy() {
        let cli = Cli::try_parse_from(["kclone", "--rename-to", "fork", "https://h/o/r"])
            .expect("parse");
        assert_eq!(cli.on_conflict, ConflictPolicy::Rename);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn rename_to_with_another_policy_is_rejected() {
        let cli = Cli::try_parse_from([
            "kclone",
            "--on-conflict",
            "overwrite",
            "--rename-to",
            "fork",
            "https://h/o/r",
        ])
        .expect("parse");
        let err = cli.validate().expect_err("conflicting flags");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn exit_code_follows_library_error_class() {
        let err = anyhow::Error::from(Error::InvalidName("..".to_string()));
        assert_eq!(exit_code(&err), 4);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
