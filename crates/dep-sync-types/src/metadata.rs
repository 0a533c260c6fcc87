use std::str::FromStr;

use mailparse::{MailHeaderMap, MailParseError};
use thiserror::Error;
use tracing::warn;

use uv_normalize::{ExtraName, InvalidNameError, PackageName};
use uv_pep440::{Version, VersionParseError};
use uv_pep508::{Pep508Error, Requirement, VerbatimUrl};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    MailParse(#[from] MailParseError),
    #[error("Metadata field {0} not found")]
    FieldNotFound(&'static str),
    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] VersionParseError),
    #[error(transparent)]
    InvalidRequirement(#[from] Box<Pep508Error>),
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),
}

impl From<Pep508Error> for MetadataError {
    fn from(error: Pep508Error) -> Self {
        Self::InvalidRequirement(Box::new(error))
    }
}

/// The subset of the core metadata specification that dependency
/// satisfaction reads: the distribution's name and version, its declared
/// transitive requirements, and its declared optional extras.
///
/// See: <https://packaging.python.org/en/latest/specifications/core-metadata/>
#[derive(Debug, Clone)]
pub struct Metadata {
    pub name: PackageName,
    pub version: Version,
    pub requires_dist: Vec<Requirement<VerbatimUrl>>,
    pub provides_extras: Vec<ExtraName>,
}

impl Metadata {
    /// Parse the [`Metadata`] from a `METADATA` file, as included in an
    /// installed distribution's `.dist-info` directory.
    pub fn parse(content: &[u8]) -> Result<Self, MetadataError> {
        let headers = Headers::parse(content)?;

        let name = PackageName::from_str(
            &headers
                .get_first_value("Name")
                .ok_or(MetadataError::FieldNotFound("Name"))?,
        )?;
        let version = Version::from_str(
            &headers
                .get_first_value("Version")
                .ok_or(MetadataError::FieldNotFound("Version"))?,
        )?;
        let requires_dist = headers
            .get_all_values("Requires-Dist")
            .map(|requires_dist| Requirement::from_str(&requires_dist))
            .collect::<Result<Vec<_>, _>>()?;
        let provides_extras = headers
            .get_all_values("Provides-Extra")
            .filter_map(|provides_extra| match ExtraName::from_str(&provides_extra) {
                Ok(extra_name) => Some(extra_name),
                Err(err) => {
                    warn!("Ignoring invalid extra: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            name,
            version,
            requires_dist,
            provides_extras,
        })
    }
}

/// The headers of a distribution metadata file.
#[derive(Debug)]
struct Headers<'a>(Vec<mailparse::MailHeader<'a>>);

impl<'a> Headers<'a> {
    fn parse(content: &'a [u8]) -> Result<Self, MailParseError> {
        let (headers, _) = mailparse::parse_headers(content)?;
        Ok(Self(headers))
    }

    /// Return the first value associated with the header with the given name.
    fn get_first_value(&self, name: &str) -> Option<String> {
        self.0.get_first_header(name).and_then(|header| {
            let value = header.get_value();
            if value == "UNKNOWN" { None } else { Some(value) }
        })
    }

    /// Return all values associated with the header with the given name.
    fn get_all_values(&self, name: &str) -> impl Iterator<Item = String> {
        self.0
            .get_all_values(name)
            .into_iter()
            .filter(|value| value != "UNKNOWN")
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn missing_name() {
        let content = "Metadata-Version: 2.3";
        let metadata = Metadata::parse(content.as_bytes());
        assert!(matches!(metadata, Err(MetadataError::FieldNotFound("Name"))));
    }

    #[test]
    fn missing_version() {
        let content = "Metadata-Version: 2.3\nName: foo";
        let metadata = Metadata::parse(content.as_bytes());
        assert!(matches!(
            metadata,
            Err(MetadataError::FieldNotFound("Version"))
        ));
    }

    #[test]
    fn name_and_version() {
        let content = "Metadata-Version: 2.3\nName: Foo_Bar\nVersion: 1.0";
        let metadata = Metadata::parse(content.as_bytes()).unwrap();
        assert_eq!(metadata.name, PackageName::from_str("foo-bar").unwrap());
        assert_eq!(metadata.version, Version::from_str("1.0").unwrap());
        assert!(metadata.requires_dist.is_empty());
        assert!(metadata.provides_extras.is_empty());
    }

    #[test]
    fn requires_dist_and_extras() {
        let content = indoc! {"
            Metadata-Version: 2.3
            Name: requests
            Version: 2.25.1
            Provides-Extra: security
            Requires-Dist: urllib3<1.27,>=1.21.1
            Requires-Dist: pyOpenSSL>=0.14; extra == 'security'

            A description body that is not part of the headers.
        "};
        let metadata = Metadata::parse(content.as_bytes()).unwrap();
        assert_eq!(metadata.requires_dist.len(), 2);
        assert_eq!(
            metadata.provides_extras,
            vec![ExtraName::from_str("security").unwrap()]
        );
    }

    #[test]
    fn invalid_requirement() {
        let content = "Metadata-Version: 2.3\nName: foo\nVersion: 1.0\nRequires-Dist: ===";
        assert!(Metadata::parse(content.as_bytes()).is_err());
    }
}
