//! Version control for the template tree.
//!
//! The engine never commits; commands call [`commit_changes`] after
//! tracking or resolving so the tree's history records each change.
//! `sync` moves that history to and from [`REMOTE`] with [`pull`] and
//! [`push`].
use std::cell::Cell;
use std::path::Path;

use anyhow::{Context as _, Result};
use git2::build::CheckoutBuilder;
use git2::{
    Cred, CredentialType, ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository, Signature, StatusOptions,
};

/// Identity used when git has no `user.name`/`user.email` configured.
const FALLBACK_NAME: &str = "dotpilot";
const FALLBACK_EMAIL: &str = "dotpilot@localhost";

/// Remote that `sync` pulls from and pushes to.
pub const REMOTE: &str = "origin";

/// Credential attempts before a fetch or push gives up.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// What [`pull`] did to the local branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Nothing new on the remote branch.
    UpToDate,
    /// The branch was moved forward to this commit.
    FastForwarded(Oid),
    /// The remote has no branch of that name yet.
    NoRemoteBranch,
}

/// Open the repository rooted exactly at `root`, if there is one.
///
/// # Errors
///
/// Returns an error if `root` holds a repository that cannot be opened.
pub fn open(root: &Path) -> Result<Option<Repository>> {
    match Repository::open(root) {
        Ok(repo) => Ok(Some(repo)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("opening repository at {}", root.display())),
    }
}

/// Initialise a repository at `root` unless one exists.
///
/// Returns `true` when a new repository was created.
///
/// # Errors
///
/// Returns an error if the repository cannot be created.
pub fn init(root: &Path) -> Result<bool> {
    if open(root)?.is_some() {
        return Ok(false);
    }
    Repository::init(root)
        .with_context(|| format!("initialising repository at {}", root.display()))?;
    Ok(true)
}

/// Clone `url` into `root`, which must not exist or be empty.
///
/// # Errors
///
/// Returns an error if the clone fails.
pub fn clone(url: &str, root: &Path) -> Result<()> {
    Repository::clone(url, root)
        .with_context(|| format!("cloning {url} into {}", root.display()))?;
    Ok(())
}

/// Fetch the current branch from `remote` and fast-forward onto it.
///
/// A branch with no commits yet simply adopts the remote's. Diverged
/// histories are refused; they have to be merged by hand.
///
/// # Errors
///
/// Returns an error if `root` is not a repository, `remote` is not
/// configured, the fetch fails, or the branch cannot be fast-forwarded.
pub fn pull(root: &Path, remote: &str) -> Result<PullOutcome> {
    let repo = require(root)?;
    let branch = current_branch(&repo)?;
    let tracking = format!("refs/remotes/{remote}/{branch}");
    let refspec = format!("+refs/heads/{branch}:{tracking}");

    let mut origin = repo
        .find_remote(remote)
        .with_context(|| format!("remote '{remote}' is not configured"))?;
    let mut opts = FetchOptions::new();
    opts.remote_callbacks(callbacks(&repo));
    origin
        .fetch(&[&refspec], Some(&mut opts), None)
        .with_context(|| format!("fetching {branch} from {remote}"))?;

    let fetched = match repo.find_reference(&tracking) {
        Ok(reference) => repo.reference_to_annotated_commit(&reference)?,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(PullOutcome::NoRemoteBranch),
        Err(e) => return Err(e).context("reading fetched branch"),
    };
    let (analysis, _) = repo.merge_analysis(&[&fetched])?;
    if analysis.is_up_to_date() {
        return Ok(PullOutcome::UpToDate);
    }
    if !(analysis.is_fast_forward() || analysis.is_unborn()) {
        anyhow::bail!(
            "cannot fast-forward {branch} onto {remote}/{branch}; merge manually in {}",
            root.display()
        );
    }

    let local = format!("refs/heads/{branch}");
    let message = format!("pull: fast-forward to {}", fetched.id());
    repo.reference(&local, fetched.id(), true, &message)
        .with_context(|| format!("moving {branch}"))?;
    repo.set_head(&local)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))
        .context("checking out pulled files")?;
    Ok(PullOutcome::FastForwarded(fetched.id()))
}

/// Push the current branch to the branch of the same name on `remote`.
///
/// Returns `false` when there is nothing to push because the branch has
/// no commits.
///
/// # Errors
///
/// Returns an error if `root` is not a repository, `remote` is not
/// configured, or the remote rejects the update.
pub fn push(root: &Path, remote: &str) -> Result<bool> {
    let repo = require(root)?;
    let branch = current_branch(&repo)?;
    match repo.head() {
        Ok(_) => {}
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(false);
        }
        Err(e) => return Err(e).context("reading HEAD"),
    }

    let mut origin = repo
        .find_remote(remote)
        .with_context(|| format!("remote '{remote}' is not configured"))?;
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    let mut rejected: Option<String> = None;
    {
        let mut cbs = callbacks(&repo);
        cbs.push_update_reference(|name, status| {
            if let Some(reason) = status {
                rejected = Some(format!("{name}: {reason}"));
            }
            Ok(())
        });
        let mut opts = PushOptions::new();
        opts.remote_callbacks(cbs);
        origin
            .push(&[&refspec], Some(&mut opts))
            .with_context(|| format!("pushing {branch} to {remote}"))?;
    }
    if let Some(reason) = rejected {
        anyhow::bail!("{remote} rejected the push ({reason}); pull first");
    }
    Ok(true)
}

/// Name of the branch `HEAD` points at, even before the first commit.
fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD").context("reading HEAD")?;
    head.symbolic_target()
        .and_then(|target| target.strip_prefix("refs/heads/"))
        .map(String::from)
        .context("HEAD is detached; check out a branch first")
}

/// Open `root` or fail because it is not a repository.
fn require(root: &Path) -> Result<Repository> {
    open(root)?.with_context(|| format!("{} is not a git repository", root.display()))
}

/// Callbacks answering credential requests from the agent or git's helpers.
fn callbacks<'a>(repo: &Repository) -> RemoteCallbacks<'a> {
    let config = repo.config().ok();
    let attempts = Cell::new(0);
    let mut cbs = RemoteCallbacks::new();
    cbs.credentials(move |url, username, allowed| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(username.unwrap_or("git"))
        } else if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            match &config {
                Some(config) => Cred::credential_helper(config, url, username),
                None => Err(git2::Error::from_str("no git config for credential helper")),
            }
        } else {
            Cred::default()
        }
    });
    cbs
}

/// `true` if the working tree has uncommitted changes (untracked included).
///
/// # Errors
///
/// Returns an error if `root` is not a repository or its status cannot be
/// read.
pub fn has_changes(root: &Path) -> Result<bool> {
    let repo = require(root)?;
    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);
    let statuses = repo.statuses(Some(&mut opts)).context("reading status")?;
    Ok(!statuses.is_empty())
}

/// Stage everything under `root` and commit it with `message`.
///
/// Returns the new commit, or `None` when the staged tree matches `HEAD`.
///
/// # Errors
///
/// Returns an error if `root` is not a repository or staging or committing
/// fails.
pub fn commit_changes(root: &Path, message: &str) -> Result<Option<Oid>> {
    let repo = require(root)?;

    let mut index = repo.index().context("reading index")?;
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .context("staging changes")?;
    index
        .update_all(["*"], None)
        .context("staging removals")?;
    index.write().context("writing index")?;
    let tree_id = index.write_tree().context("writing tree")?;
    let tree = repo.find_tree(tree_id)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(e).context("reading HEAD"),
    };
    if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
        return Ok(None);
    }

    let signature = repo
        .signature()
        .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;
    let parents: Vec<_> = parent.iter().collect();
    let oid = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .context("creating commit")?;
    Ok(Some(oid))
}
