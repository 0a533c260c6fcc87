use std::process::Command;

use tracing::debug;

use dep_sync_types::VcsKind;

/// A strategy for querying the current commit of a remote repository.
///
/// Registered per [`VcsKind`] so that additional systems can be supported
/// without touching the direct-URL decision table.
pub(crate) trait RemoteRevision {
    /// Query the remote's commit id for the given revision, or for the
    /// default branch if no revision is given.
    ///
    /// Returns `None` on any failure: a missing executable, a non-zero exit
    /// status, or empty output. The query is blocking, is never retried, and
    /// no timeout is imposed at this layer.
    fn query(&self, url: &str, revision: Option<&str>) -> Option<String>;
}

/// Look up the registered strategy for a VCS kind, if any.
pub(crate) fn strategy_for(vcs: VcsKind) -> Option<&'static dyn RemoteRevision> {
    match vcs {
        VcsKind::Git => Some(&Git),
        // TODO(dep-sync): register strategies for Mercurial et al. once a
        // consumer needs them.
        VcsKind::Hg | VcsKind::Bzr | VcsKind::Svn => None,
    }
}

struct Git;

impl RemoteRevision for Git {
    fn query(&self, url: &str, revision: Option<&str>) -> Option<String> {
        let mut command = Command::new("git");
        command.arg("ls-remote");
        // Disable interactive prompts.
        command.env("GIT_TERMINAL_PROMPT", "0");
        command.arg(url);
        if let Some(revision) = revision {
            command.arg(revision);
        }

        debug!("Running `git ls-remote` for {url}");
        let output = match command.output() {
            Ok(output) => output,
            Err(err) => {
                debug!("Failed to run `git ls-remote` for {url}: {err}");
                return None;
            }
        };
        if !output.status.success() {
            debug!("`git ls-remote` failed for {url}: {}", output.status);
            return None;
        }

        // The output format is `<commit>\t<ref>` per line; the commit of the
        // first matching ref is the one we're after.
        let stdout = String::from_utf8(output.stdout).ok()?;
        let commit = stdout.split_whitespace().next()?;
        debug!("`git ls-remote` resolved {url} to {commit}");
        Some(commit.to_string())
    }
}
