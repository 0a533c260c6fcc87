//! Check whether declared dependencies are satisfied by the distributions
//! installed in a Python environment, without invoking an installer.
//!
//! The entry point is [`InstalledDistributions`], a cached, lazily-populated
//! index over the installed distributions on a search path. Callers parse
//! their declarations into [`Dependency`] values and ask the index whether
//! they're satisfied:
//!
//! ```rust,ignore
//! let mut distributions = InstalledDistributions::new(sys_path, environment);
//! let ready = distributions.dependencies_satisfied(&dependencies);
//! ```
//!
//! Nothing here installs, resolves, or downloads; the environment is only
//! ever read.

use std::path::PathBuf;

use uv_pep508::MarkerEnvironment;

pub use crate::dependency::Dependency;
pub use crate::site_packages::{DependencyState, Discovery, InstalledDistributions};

mod dependency;
mod path;
mod satisfies;
mod site_packages;
mod vcs;

/// Check whether all the given dependencies are satisfied, constructing a
/// one-shot [`InstalledDistributions`] index for the given search path.
///
/// Prefer creating the index directly when performing repeated checks
/// against an unchanged environment.
pub fn dependencies_satisfied(
    dependencies: &[Dependency],
    sys_path: Vec<PathBuf>,
    environment: MarkerEnvironment,
) -> bool {
    InstalledDistributions::new(sys_path, environment).dependencies_satisfied(dependencies)
}

/// Compute the [`DependencyState`] of the given dependencies, constructing a
/// one-shot [`InstalledDistributions`] index for the given search path.
pub fn dependency_state(
    dependencies: &[Dependency],
    exhaustive: bool,
    sys_path: Vec<PathBuf>,
    environment: MarkerEnvironment,
) -> DependencyState {
    InstalledDistributions::new(sys_path, environment).dependency_state(dependencies, exhaustive)
}
