//! Clone engine: libgit2-backed repository cloning with submodule recursion

use super::signals::{PhaseTracker, TransferSnapshot};
use crate::error::CloneError;
use crate::progress::ProgressListener;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository, SubmoduleUpdateOptions,
};
use std::cell::RefCell;
use std::path::Path;

/// libgit2 re-invokes the credentials callback after every rejection.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Performs the network transfer and working-tree checkout for a clone.
pub trait CloneEngine {
    /// Clone `url` into `dest`, recursing into submodules and reporting
    /// phases to `listener` on the calling thread.
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), CloneError>;
}

#[derive(Debug, Clone)]
pub struct Git2Engine {
    recurse_submodules: bool,
}

impl Git2Engine {
    pub fn new() -> Self {
        Self { recurse_submodules: true }
    }

    pub fn recurse_submodules(mut self, recurse: bool) -> Self {
        self.recurse_submodules = recurse;
        self
    }
}

impl Default for Git2Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl CloneEngine for Git2Engine {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        listener: &mut dyn ProgressListener,
    ) -> Result<(), CloneError> {
        let tracker = RefCell::new(PhaseTracker::new(listener));

        tracing::debug!("Cloning {} into {}", url, dest.display());
        let repo = {
            let mut fetch = FetchOptions::new();
            fetch.remote_callbacks(remote_callbacks(&tracker));

            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch).with_checkout(checkout_builder(&tracker));
            builder.clone(url, dest)?
        };
        tracker.borrow_mut().close();

        if self.recurse_submodules {
            update_submodules(&repo, &tracker)?;
        }
        Ok(())
    }
}

fn remote_callbacks<'a, 'l: 'a>(tracker: &'a RefCell<PhaseTracker<'l>>) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.sideband_progress(move |data| {
        tracker.borrow_mut().sideband(data);
        true
    });
    callbacks.transfer_progress(move |stats| {
        tracker.borrow_mut().transfer(TransferSnapshot::from(&stats));
        true
    });

    let mut attempts = 0;
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username);
        }
        Cred::default()
    });
    callbacks
}

fn checkout_builder<'a, 'l: 'a>(tracker: &'a RefCell<PhaseTracker<'l>>) -> CheckoutBuilder<'a> {
    let mut checkout = CheckoutBuilder::new();
    checkout.progress(move |_path, current, total| {
        tracker.borrow_mut().checkout(current, total);
    });
    checkout
}

fn update_submodules(
    repo: &Repository,
    tracker: &RefCell<PhaseTracker<'_>>,
) -> Result<(), CloneError> {
    for mut submodule in repo.submodules()? {
        let name = submodule.name().unwrap_or("<unnamed>").to_string();
        tracing::debug!("Updating submodule {}", name);

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(tracker));
        let mut options = SubmoduleUpdateOptions::new();
        options.fetch(fetch);
        options.checkout(checkout_builder(tracker));

        let submodule_err = |source| CloneError::Submodule { name: name.clone(), source };
        submodule.update(true, Some(&mut options)).map_err(submodule_err)?;
        tracker.borrow_mut().close();

        let nested = submodule.open().map_err(submodule_err)?;
        update_submodules(&nested, tracker)?;
    }
    Ok(())
}
