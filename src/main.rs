//! kclone: clone git repositories into an organized directory tree
//!
//! `kclone https://github.com/owner/repo.git` clones into
//! `<base>/github.com/owner/repo` with per-phase progress bars.

use std::process::ExitCode;

fn main() -> ExitCode {
    kclone::cli::run()
}
