use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use fs_err as fs;
use thiserror::Error;

use uv_normalize::PackageName;
use uv_pep440::Version;

use crate::direct_url::DirectUrl;
use crate::metadata::{Metadata, MetadataError};

#[derive(Error, Debug)]
pub enum InstalledDistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    VersionParse(#[from] uv_pep440::VersionParseError),

    #[error(transparent)]
    PackageNameParse(#[from] uv_normalize::InvalidNameError),

    #[error("Failed to parse METADATA file: `{path}`")]
    MetadataParse {
        path: String,
        #[source]
        err: Box<MetadataError>,
    },
}

/// An installed distribution, backed by a `.dist-info` directory on disk.
///
/// The name and version are parsed from the directory name; the `METADATA`
/// contents are read lazily and cached, as the record is immutable after
/// creation.
#[derive(Debug, Clone)]
pub struct InstalledDist {
    name: PackageName,
    version: Version,
    path: Box<Path>,
    metadata_cache: OnceLock<Metadata>,
}

impl InstalledDist {
    /// Try to parse a distribution from a `.dist-info` directory path (like
    /// `django-5.0a1.dist-info`).
    ///
    /// Returns `Ok(None)` if the path is not a `.dist-info` directory.
    ///
    /// See: <https://packaging.python.org/en/latest/specifications/recording-installed-packages/>
    pub fn try_from_path(path: &Path) -> Result<Option<Self>, InstalledDistError> {
        // Ex) `cffi-1.16.0.dist-info`
        if !path.extension().is_some_and(|ext| ext == "dist-info") {
            return Ok(None);
        }
        let Some(file_stem) = path.file_stem() else {
            return Ok(None);
        };
        let Some(file_stem) = file_stem.to_str() else {
            return Ok(None);
        };
        let Some((name, version)) = file_stem.split_once('-') else {
            return Ok(None);
        };

        let name = PackageName::from_str(name)?;
        let version = Version::from_str(version)?;

        Ok(Some(Self {
            name,
            version,
            path: path.to_path_buf().into_boxed_path(),
            metadata_cache: OnceLock::new(),
        }))
    }

    /// The normalized name of the distribution.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The installed [`Version`] of the distribution.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The `.dist-info` directory backing the distribution.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the `METADATA` file of the distribution, caching the parsed
    /// contents for subsequent reads.
    pub fn metadata(&self) -> Result<&Metadata, InstalledDistError> {
        if let Some(metadata) = self.metadata_cache.get() {
            return Ok(metadata);
        }

        let path = self.path.join("METADATA");
        let contents = fs::read(&path)?;
        let metadata =
            Metadata::parse(&contents).map_err(|err| InstalledDistError::MetadataParse {
                path: path.display().to_string(),
                err: Box::new(err),
            })?;

        Ok(self.metadata_cache.get_or_init(|| metadata))
    }

    /// Read the `direct_url.json` file of the distribution, if present.
    ///
    /// The record is intentionally not cached: it's only consulted on the
    /// direct-URL matching path, which is expected to be rare.
    pub fn read_direct_url(&self) -> Result<Option<DirectUrl>, InstalledDistError> {
        let path = self.path.join("direct_url.json");
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let direct_url =
            serde_json::from_reader::<BufReader<fs::File>, DirectUrl>(BufReader::new(file))?;
        Ok(Some(direct_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dist_info_directory() -> std::io::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("Foo_Bar-1.0.dist-info");
        std::fs::create_dir(&path)?;

        let dist = InstalledDist::try_from_path(&path).unwrap().unwrap();
        assert_eq!(dist.name(), &PackageName::from_str("foo-bar").unwrap());
        assert_eq!(dist.version(), &Version::from_str("1.0").unwrap());
        Ok(())
    }

    #[test]
    fn not_a_dist_info() {
        let dist = InstalledDist::try_from_path(Path::new("/site-packages/foo")).unwrap();
        assert!(dist.is_none());

        let dist = InstalledDist::try_from_path(Path::new("/site-packages/foo.egg-info")).unwrap();
        assert!(dist.is_none());
    }

    #[test]
    fn invalid_version() {
        let path = Path::new("/site-packages/foo-not.a.version!.dist-info");
        assert!(InstalledDist::try_from_path(path).is_err());
    }

    #[test]
    fn missing_direct_url() -> std::io::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("foo-1.0.dist-info");
        std::fs::create_dir(&path)?;

        let dist = InstalledDist::try_from_path(&path).unwrap().unwrap();
        assert!(dist.read_direct_url().unwrap().is_none());
        Ok(())
    }
}
