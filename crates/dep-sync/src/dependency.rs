use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use uv_normalize::{ExtraName, PackageName};
use uv_pep440::VersionSpecifiers;
use uv_pep508::{MarkerTree, Pep508Error, Requirement, VerbatimUrl, VersionOrUrl};

use crate::path::path_from_url;

/// A declared dependency: a PEP 508 requirement with support for editable
/// metadata.
///
/// The `editable` flag is only meaningful for requirements with a direct
/// reference URL; it's silently coerced to `false` otherwise.
#[derive(Debug, Clone)]
pub struct Dependency {
    requirement: Requirement<VerbatimUrl>,
    editable: bool,
    /// The derived local filesystem path, computed at most once from the
    /// direct-reference URL.
    path: OnceLock<Option<PathBuf>>,
}

impl Dependency {
    /// Parse a dependency declaration.
    ///
    /// Returns an error if the input doesn't conform to the dependency
    /// specifier grammar; this is the only hard failure in the crate.
    pub fn new(input: &str, editable: bool) -> Result<Self, Pep508Error> {
        let requirement = Requirement::<VerbatimUrl>::from_str(input)?;
        Ok(Self::from_requirement(requirement, editable))
    }

    fn from_requirement(requirement: Requirement<VerbatimUrl>, editable: bool) -> Self {
        // Editable installs only exist for direct references.
        let editable = editable && matches!(requirement.version_or_url, Some(VersionOrUrl::Url(_)));
        Self {
            requirement,
            editable,
            path: OnceLock::new(),
        }
    }

    /// The normalized name of the requested package.
    pub fn name(&self) -> &PackageName {
        &self.requirement.name
    }

    /// The requested extras.
    pub fn extras(&self) -> &[ExtraName] {
        &self.requirement.extras
    }

    /// The requirement's environment marker.
    pub fn marker(&self) -> MarkerTree {
        self.requirement.marker
    }

    /// The requested version specifiers, if the requirement pins a version
    /// rather than a URL.
    pub fn specifier(&self) -> Option<&VersionSpecifiers> {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifier)) => Some(specifier),
            _ => None,
        }
    }

    /// The direct-reference URL, if any.
    pub fn url(&self) -> Option<&VerbatimUrl> {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::Url(url)) => Some(url),
            _ => None,
        }
    }

    /// Whether the dependency should be installed as editable.
    pub fn editable(&self) -> bool {
        self.editable
    }

    /// The local filesystem path of the dependency, if its direct-reference
    /// URL is a `file:` URL.
    ///
    /// Derivation is deterministic and cached for the dependency's lifetime.
    pub fn path(&self) -> Option<&Path> {
        self.path
            .get_or_init(|| self.url().and_then(|url| path_from_url(url)))
            .as_deref()
    }
}

impl From<Requirement<VerbatimUrl>> for Dependency {
    fn from(requirement: Requirement<VerbatimUrl>) -> Self {
        Self::from_requirement(requirement, false)
    }
}

impl FromStr for Dependency {
    type Err = Pep508Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::new(input, false)
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        // The path cache is derived state.
        self.requirement == other.requirement && self.editable == other.editable
    }
}

impl Eq for Dependency {}

impl std::hash::Hash for Dependency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.requirement.hash(state);
        self.editable.hash(state);
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.requirement.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn editable_without_url() {
        let dependency = Dependency::new("pkg", true).unwrap();
        assert!(!dependency.editable());
    }

    #[test]
    fn editable_with_url() {
        let dependency = Dependency::new("pkg @ file:///a/b/c", true).unwrap();
        assert!(dependency.editable());
    }

    #[test]
    fn editable_defaults_to_false() {
        let dependency = Dependency::new("pkg @ file:///a/b/c", false).unwrap();
        assert!(!dependency.editable());
    }

    #[test]
    fn path_without_url() {
        let dependency = Dependency::new("pkg", false).unwrap();
        assert_eq!(dependency.path(), None);
    }

    #[test]
    fn path_scheme_not_file() {
        let dependency = Dependency::new("pkg @ git+https://foo/bar/baz.git", false).unwrap();
        assert_eq!(dependency.path(), None);
    }

    #[test]
    #[cfg(not(windows))]
    fn path_unix() {
        let dependency = Dependency::new("pkg @ file:///c/b/a", false).unwrap();
        assert_eq!(dependency.path(), Some(PathBuf::from("/c/b/a").as_path()));
    }

    #[test]
    #[cfg(windows)]
    fn path_windows() {
        let dependency = Dependency::new("pkg @ file:///C:/b/a", false).unwrap();
        assert_eq!(
            dependency.path(),
            Some(PathBuf::from("C:\\b\\a").as_path())
        );
    }

    #[test]
    fn path_is_cached() {
        let dependency = Dependency::new("pkg @ file:///c/b/a", false).unwrap();
        let first = dependency.path().unwrap();
        let second = dependency.path().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn malformed_input() {
        assert!(Dependency::new("pkg ===", false).is_err());
        assert!(Dependency::new("", false).is_err());
    }
}
