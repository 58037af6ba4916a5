//! Recursive directory removal with retry and forced escalation

use crate::error::DeleteError;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// The two ways a directory can be deleted
pub trait Remover {
    /// In-process recursive delete
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// OS-level forced recursive delete
    fn force_remove(&self, path: &Path) -> io::Result<()>;
}

pub struct SystemRemover;

impl Remover for SystemRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn force_remove(&self, path: &Path) -> io::Result<()> {
        run_force_remove(force_remove_command(path), path)
    }
}

/// A command that cannot be started is reported as `Other`, never as
/// `NotFound`, so it is not mistaken for an already-deleted path.
fn run_force_remove(mut cmd: Command, path: &Path) -> io::Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let status = cmd.status().map_err(|err| {
        io::Error::new(io::ErrorKind::Other, format!("could not run {program}: {err}"))
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("forced delete of {} exited with {}", path.display(), status),
        ))
    }
}

#[cfg(windows)]
fn force_remove_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "rd", "/s", "/q"]).arg(path);
    cmd
}

#[cfg(not(windows))]
fn force_remove_command(path: &Path) -> Command {
    let mut cmd = Command::new("rm");
    cmd.arg("-rf").arg(path);
    cmd
}

/// Deletes a directory tree, retrying permission failures.
///
/// The first attempt uses [`Remover::remove`]. Each later attempt waits
/// `delay` and escalates to [`Remover::force_remove`].
pub struct SafeRemover<R = SystemRemover> {
    remover: R,
    max_attempts: u32,
    delay: Duration,
}

impl SafeRemover<SystemRemover> {
    pub fn new() -> Self {
        Self::with_remover(SystemRemover)
    }
}

impl Default for SafeRemover<SystemRemover> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Remover> SafeRemover<R> {
    pub fn with_remover(remover: R) -> Self {
        Self { remover, max_attempts: MAX_ATTEMPTS, delay: RETRY_DELAY }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Remove `path`, returning the number of attempts it took.
    pub fn remove(&self, path: &Path) -> Result<u32, DeleteError> {
        let mut attempt = 1;
        let mut result = self.remover.remove(path);

        loop {
            let err = match result {
                Ok(()) => return Ok(attempt),
                Err(err) if err.kind() == io::ErrorKind::NotFound && !path.exists() => {
                    return Ok(attempt)
                }
                Err(err) => err,
            };

            let retryable = err.kind() == io::ErrorKind::PermissionDenied;
            if !retryable || attempt >= self.max_attempts {
                println!(
                    "Unable to delete directory {}. Please delete it manually and retry.",
                    path.display()
                );
                let path = path.to_path_buf();
                return Err(if retryable {
                    DeleteError::Exhausted { path, attempts: attempt, source: err }
                } else {
                    DeleteError::Failed { path, source: err }
                });
            }

            tracing::warn!("Deleting {} failed: {}", path.display(), err);
            println!(
                "Failed to delete directory, retrying... (attempt {}/{})",
                attempt, self.max_attempts
            );
            std::thread::sleep(self.delay);

            attempt += 1;
            result = self.remover.force_remove(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Fails with permission-denied a fixed number of times across both
    /// removal kinds, recording which were called.
    struct FlakyRemover {
        failures: RefCell<u32>,
        calls: RefCell<Vec<&'static str>>,
        kind: io::ErrorKind,
    }

    impl FlakyRemover {
        fn new(failures: u32) -> Self {
            Self::with_kind(failures, io::ErrorKind::PermissionDenied)
        }

        fn with_kind(failures: u32, kind: io::ErrorKind) -> Self {
            Self { failures: RefCell::new(failures), calls: RefCell::new(Vec::new()), kind }
        }

        fn attempt(&self, name: &'static str) -> io::Result<()> {
            self.calls.borrow_mut().push(name);
            let mut failures = self.failures.borrow_mut();
            if *failures > 0 {
                *failures -= 1;
                Err(io::Error::new(self.kind, "locked"))
            } else {
                Ok(())
            }
        }
    }

    impl Remover for &FlakyRemover {
        fn remove(&self, _path: &Path) -> io::Result<()> {
            self.attempt("remove")
        }

        fn force_remove(&self, _path: &Path) -> io::Result<()> {
            self.attempt("force")
        }
    }

    #[test]
    fn succeeds_on_forced_delete_after_two_failures() {
        let flaky = FlakyRemover::new(2);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        let attempts = remover.remove(Path::new("/locked")).expect("third attempt succeeds");
        assert_eq!(attempts, 3);
        assert_eq!(*flaky.calls.borrow(), vec!["remove", "force", "force"]);
    }

    #[test]
    fn permanent_failure_exhausts_attempts_without_panicking() {
        let flaky = FlakyRemover::new(u32::MAX);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        let err = remover.remove(Path::new("/locked")).expect_err("never succeeds");
        assert!(matches!(err, DeleteError::Exhausted { attempts: 3, .. }));
        assert_eq!(flaky.calls.borrow().len(), 3);
    }

    #[test]
    fn first_attempt_success_needs_no_escalation() {
        let flaky = FlakyRemover::new(0);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        assert_eq!(remover.remove(Path::new("/free")).expect("removed"), 1);
        assert_eq!(*flaky.calls.borrow(), vec!["remove"]);
    }

    #[test]
    fn other_io_errors_are_not_retried() {
        let flaky = FlakyRemover::with_kind(1, io::ErrorKind::InvalidInput);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        assert!(matches!(remover.remove(Path::new("/x")), Err(DeleteError::Failed { .. })));
        assert_eq!(flaky.calls.borrow().len(), 1);
    }

    #[test]
    fn vanished_directory_counts_as_removed() {
        let flaky = FlakyRemover::with_kind(1, io::ErrorKind::NotFound);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        assert_eq!(remover.remove(Path::new("/gone")).expect("removed"), 1);
    }

    /// In-process delete is denied; the forced delete runs `program`.
    struct BrokenForceRemover(&'static str);

    impl Remover for BrokenForceRemover {
        fn remove(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }

        fn force_remove(&self, path: &Path) -> io::Result<()> {
            run_force_remove(Command::new(self.0), path)
        }
    }

    #[test]
    fn missing_force_delete_program_is_not_mistaken_for_success() {
        let tmp = TempDir::new().expect("tmp");
        let target = tmp.path().join("repo");
        fs::create_dir_all(&target).expect("mkdir");

        let remover = SafeRemover::with_remover(BrokenForceRemover("kclone-no-such-program"))
            .delay(Duration::ZERO);
        let err = remover.remove(&target).expect_err("directory is still there");

        assert!(matches!(err, DeleteError::Failed { .. }));
        assert!(target.exists());
    }

    #[test]
    fn not_found_for_an_existing_path_is_a_failure() {
        let tmp = TempDir::new().expect("tmp");
        let flaky = FlakyRemover::with_kind(1, io::ErrorKind::NotFound);
        let remover = SafeRemover::with_remover(&flaky).delay(Duration::ZERO);

        assert!(matches!(remover.remove(tmp.path()), Err(DeleteError::Failed { .. })));
    }

    #[test]
    fn system_remover_deletes_a_real_tree() {
        let tmp = TempDir::new().expect("tmp");
        let target = tmp.path().join("repo");
        fs::create_dir_all(target.join("nested")).expect("mkdir");
        fs::write(target.join("nested").join("file.txt"), "x").expect("write");

        assert_eq!(SafeRemover::new().remove(&target).expect("removed"), 1);
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn system_force_remove_deletes_a_real_tree() {
        let tmp = TempDir::new().expect("tmp");
        let target = tmp.path().join("repo");
        fs::create_dir_all(target.join("a").join("b")).expect("mkdir");

        SystemRemover.force_remove(&target).expect("rm -rf");
        assert!(!target.exists());
    }
}
