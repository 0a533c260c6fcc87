use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fs_err as fs;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use dep_sync_types::InstalledDist;
use uv_normalize::{ExtraName, PackageName};
use uv_pep508::MarkerEnvironment;

use crate::dependency::Dependency;
use crate::satisfies::RequirementSatisfaction;

/// An index over the distributions installed in an environment.
///
/// Distributions are discovered lazily and cached by normalized name, so
/// repeated checks against an unchanged environment never re-read a
/// `.dist-info` directory. The index is a snapshot: changes made to the
/// environment after creation are not reflected, and there is no refresh.
///
/// All methods take `&mut self`; a single index must not be shared across
/// concurrent checks without external synchronization.
#[derive(Debug)]
pub struct InstalledDistributions {
    /// The marker environment used for all evaluations.
    environment: MarkerEnvironment,
    /// The discovery iterator, consumed at most once, incrementally.
    discovery: Discovery,
    /// The distributions discovered so far, keyed by normalized name.
    distributions: FxHashMap<PackageName, InstalledDist>,
    /// Whether discovery has been fully drained. Once set, `distributions`
    /// is the complete set for the search path.
    exhausted: bool,
}

impl InstalledDistributions {
    /// Create an index over the distributions installed on the given search
    /// path, evaluating markers against the given environment.
    pub fn new(sys_path: Vec<PathBuf>, environment: MarkerEnvironment) -> Self {
        Self::from_discovery(Discovery::new(sys_path), environment)
    }

    /// Create an index from an existing [`Discovery`] iterator.
    pub fn from_discovery(discovery: Discovery, environment: MarkerEnvironment) -> Self {
        Self {
            environment,
            discovery,
            distributions: FxHashMap::default(),
            exhausted: false,
        }
    }

    /// Look up an installed distribution by name.
    ///
    /// On a cache miss, discovery is advanced (caching every distribution it
    /// yields) until the name is found or the search path is exhausted;
    /// progress is never repeated.
    pub fn get(&mut self, name: &PackageName) -> Option<&InstalledDist> {
        if !self.distributions.contains_key(name) && !self.exhausted {
            loop {
                let Some(distribution) = self.discovery.next() else {
                    self.exhausted = true;
                    break;
                };
                let found = distribution.name() == name;
                self.distributions
                    .insert(distribution.name().clone(), distribution);
                if found {
                    break;
                }
            }
        }
        self.distributions.get(name)
    }

    /// Returns whether all the given dependencies are satisfied.
    ///
    /// Stops at the first unsatisfied dependency, so this should be
    /// preferred for simple readiness checks.
    pub fn dependencies_satisfied(&mut self, dependencies: &[Dependency]) -> bool {
        dependencies
            .iter()
            .all(|dependency| self.satisfied(dependency, &[]))
    }

    /// Classify every dependency as satisfied or missing, preserving input
    /// order within each bucket.
    ///
    /// If `exhaustive` is set, discovery is fully drained and the names of
    /// installed distributions that weren't requested are reported in
    /// [`DependencyState::not_required`]; if discovery was already drained,
    /// that's a pure in-memory computation.
    pub fn dependency_state(
        &mut self,
        dependencies: &[Dependency],
        exhaustive: bool,
    ) -> DependencyState {
        let mut satisfied = Vec::new();
        let mut missing = Vec::new();
        let mut not_required = Vec::new();

        let mut requested = FxHashSet::default();
        for dependency in dependencies {
            requested.insert(dependency.name().clone());
            if self.satisfied(dependency, &[]) {
                satisfied.push(dependency.clone());
            } else {
                missing.push(dependency.clone());
            }
        }

        if exhaustive {
            if !self.exhausted {
                while let Some(distribution) = self.discovery.next() {
                    self.distributions
                        .insert(distribution.name().clone(), distribution);
                }
                self.exhausted = true;
            }
            not_required.extend(
                self.distributions
                    .keys()
                    .filter(|name| !requested.contains(*name))
                    .cloned(),
            );
            not_required.sort();
        }

        DependencyState {
            satisfied,
            missing,
            not_required,
        }
    }

    /// Returns whether a single dependency is satisfied.
    ///
    /// `active_extras` binds the `extra` marker variable during the
    /// recursive extras walk; the top-level call passes none. Passing the
    /// binding down explicitly (rather than mutating a shared environment)
    /// keeps the recursion reentrant.
    fn satisfied(&mut self, dependency: &Dependency, active_extras: &[ExtraName]) -> bool {
        // A dependency whose marker doesn't apply in this environment is
        // vacuously satisfied.
        if !dependency
            .marker()
            .evaluate(&self.environment, active_extras)
        {
            trace!("Marker not applicable in this environment: {dependency}");
            return true;
        }

        let Some(distribution) = self.get(dependency.name()).cloned() else {
            debug!("Distribution not installed: {}", dependency.name());
            return false;
        };

        let extras = dependency.extras();
        if !extras.is_empty() {
            let Ok(metadata) = distribution.metadata() else {
                debug!("Failed to read metadata for: {}", dependency.name());
                return false;
            };
            if metadata.requires_dist.is_empty() {
                return false;
            }

            for requirement in &metadata.requires_dist {
                // Only requirements conditional on a marker participate in
                // the extras walk; an extra whose requirements carry no
                // marker is never checked. This mirrors the installer
                // behavior and can read a typo'd extra as permanently
                // unsatisfied.
                //
                // See: <https://github.com/pypa/pip/issues/7122>
                if requirement.marker.is_true() {
                    continue;
                }
                let transitive = Dependency::from(requirement.clone());
                for extra in extras {
                    if !metadata.provides_extras.contains(extra) {
                        debug!("Extra `{extra}` not provided by {}", dependency.name());
                        return false;
                    }
                    if !self.satisfied(&transitive, std::slice::from_ref(extra)) {
                        return false;
                    }
                }
            }
        }

        if let Some(specifier) = dependency.specifier() {
            if !specifier.contains(distribution.version()) {
                debug!(
                    "Installed version {} does not satisfy: {dependency}",
                    distribution.version()
                );
                return false;
            }
        }

        if dependency.url().is_none() {
            return true;
        }

        // Direct references are verified against the recorded installation
        // origin; a distribution without one can't be verified.
        let Ok(Some(direct_url)) = distribution.read_direct_url() else {
            debug!(
                "No installation origin recorded for {}; cannot verify: {dependency}",
                dependency.name()
            );
            return false;
        };
        matches!(
            RequirementSatisfaction::check(&direct_url, dependency),
            RequirementSatisfaction::Satisfied
        )
    }
}

/// The classification of a set of dependencies within an environment, as
/// returned by [`InstalledDistributions::dependency_state`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyState {
    /// The dependencies that are satisfied, in input order.
    pub satisfied: Vec<Dependency>,
    /// The dependencies that are missing, in input order.
    pub missing: Vec<Dependency>,
    /// The names of installed distributions that weren't requested, sorted.
    /// Only populated by exhaustive scans.
    pub not_required: Vec<PackageName>,
}

/// A lazy iterator over the distributions installed on a search path.
///
/// Each search-path directory is read once, with entries visited in sorted
/// order (`read_dir` order is not stable across platforms). Unreadable
/// directories and malformed entries are skipped rather than failing the
/// enumeration: a distribution that can't be read is indistinguishable from
/// one that isn't installed.
#[derive(Debug)]
pub struct Discovery {
    search_paths: std::vec::IntoIter<PathBuf>,
    entries: std::collections::btree_set::IntoIter<PathBuf>,
}

impl Discovery {
    /// Create a discovery iterator over the given search-path snapshot.
    pub fn new(sys_path: Vec<PathBuf>) -> Self {
        Self {
            search_paths: sys_path.into_iter(),
            entries: BTreeSet::new().into_iter(),
        }
    }
}

impl Iterator for Discovery {
    type Item = InstalledDist;

    fn next(&mut self) -> Option<InstalledDist> {
        loop {
            if let Some(path) = self.entries.next() {
                match InstalledDist::try_from_path(&path) {
                    Ok(Some(distribution)) => return Some(distribution),
                    Ok(None) => {}
                    Err(err) => {
                        debug!("Skipping `{}`: {err}", path.display());
                    }
                }
                continue;
            }

            let directory = self.search_paths.next()?;
            self.entries = read_directory(&directory).into_iter();
        }
    }
}

/// Collect the sorted directory entries of a search-path directory.
fn read_directory(directory: &Path) -> BTreeSet<PathBuf> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return BTreeSet::new();
        }
        Err(err) => {
            warn!("Failed to read search path `{}`: {err}", directory.display());
            return BTreeSet::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_dir()))
        .map(|entry| entry.path())
        .collect()
}
