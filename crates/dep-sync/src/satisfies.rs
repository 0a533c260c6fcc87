use tracing::{debug, trace};
use url::Url;

use dep_sync_types::{DirectUrl, VcsInfo};

use crate::dependency::Dependency;
use crate::path::path_from_url;
use crate::vcs;

#[derive(Debug, Copy, Clone)]
pub(crate) enum RequirementSatisfaction {
    Satisfied,
    Mismatch,
}

impl RequirementSatisfaction {
    /// Returns whether a direct-reference dependency matches the
    /// installation-origin record of an installed distribution.
    ///
    /// Every unverifiable condition is a [`Self::Mismatch`]: the check never
    /// fails, it only declines to confirm.
    pub(crate) fn check(direct_url: &DirectUrl, dependency: &Dependency) -> Self {
        trace!("Comparing installed origin with dependency: {direct_url:?} {dependency}");

        let Some(requested_url) = dependency.url() else {
            return Self::Mismatch;
        };
        // Compare against the dependency's verbatim spelling when it was
        // preserved, falling back to the parsed URL's serialization.
        let requested = requested_url
            .given()
            .map(str::to_string)
            .unwrap_or_else(|| requested_url.to_url().to_string());
        let requested = requested.as_str();

        match direct_url {
            DirectUrl::LocalDirectory { url, .. } => {
                if direct_url.is_editable() != dependency.editable() {
                    trace!(
                        "Editable mismatch: {} vs. {}",
                        direct_url.is_editable(),
                        dependency.editable()
                    );
                    return Self::Mismatch;
                }

                let installed_path = Url::parse(url).ok().and_then(|url| path_from_url(&url));
                if installed_path.as_deref() != dependency.path() {
                    trace!(
                        "Path mismatch: {installed_path:?} vs. {:?}",
                        dependency.path()
                    );
                    return Self::Mismatch;
                }

                Self::Satisfied
            }
            DirectUrl::VcsUrl {
                url,
                vcs_info:
                    VcsInfo {
                        vcs,
                        commit_id,
                        requested_revision,
                    },
            } => {
                // A dependency pinned to the resolved commit matches without
                // consulting the remote.
                //
                // See: <https://peps.python.org/pep-0440/#direct-references>
                if requested_revision.as_ref().is_some_and(|revision| {
                    requested == format!("{vcs}+{url}@{revision}#{commit_id}")
                }) || requested == format!("{vcs}+{url}@{commit_id}")
                {
                    return Self::Satisfied;
                }

                // A dependency without a resolved pin (bare, or pinned to the
                // originally requested revision) can only be verified against
                // the remote's current commit. This is the one slow path in
                // the crate: a blocking subprocess, re-run on every call.
                if requested == format!("{vcs}+{url}")
                    || requested_revision
                        .as_ref()
                        .is_some_and(|revision| requested == format!("{vcs}+{url}@{revision}"))
                {
                    let Some(strategy) = vcs::strategy_for(*vcs) else {
                        debug!("No remote-revision strategy registered for {vcs}");
                        return Self::Mismatch;
                    };
                    return match strategy.query(url, requested_revision.as_deref()) {
                        Some(remote_commit) if remote_commit == *commit_id => Self::Satisfied,
                        _ => Self::Mismatch,
                    };
                }

                Self::Mismatch
            }
            DirectUrl::ArchiveUrl { url, .. } => {
                // Plain URLs must match exactly; no normalization.
                if *url == requested {
                    Self::Satisfied
                } else {
                    Self::Mismatch
                }
            }
        }
    }
}
