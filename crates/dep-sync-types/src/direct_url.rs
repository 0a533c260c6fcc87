use serde::{Deserialize, Serialize};

/// Metadata for a distribution that was installed from a direct URL, as
/// recorded in the `direct_url.json` file of its `.dist-info` directory.
///
/// The record has a required `url` and at most one of `dir_info` or
/// `vcs_info`; absence of both means the distribution was installed from a
/// plain URL (e.g., a source or wheel archive).
///
/// Decoding classifies by field presence, so a record whose `dir_info` or
/// `vcs_info` is present but malformed is a decode error rather than a
/// plain-URL origin.
///
/// See: <https://packaging.python.org/en/latest/specifications/direct-url/>
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DirectUrl {
    /// The distribution was installed from a local directory.
    ///
    /// Ex) `{"url": "file:///home/user/project", "dir_info": {"editable": true}}`
    LocalDirectory {
        url: String,
        dir_info: DirInfo,
    },
    /// The distribution was installed from a version-control checkout.
    ///
    /// Ex) `{"url": "https://github.com/psf/requests", "vcs_info": {"vcs": "git", "commit_id": "..."}}`
    VcsUrl {
        url: String,
        vcs_info: VcsInfo,
    },
    /// The distribution was installed from a plain URL.
    ///
    /// Ex) `{"url": "https://example.org/archive.zip", "archive_info": {}}`
    ArchiveUrl {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        archive_info: Option<ArchiveInfo>,
    },
}

impl DirectUrl {
    /// Return the recorded URL, without any VCS prefix or revision suffix.
    pub fn url(&self) -> &str {
        match self {
            Self::LocalDirectory { url, .. } => url,
            Self::VcsUrl { url, .. } => url,
            Self::ArchiveUrl { url, .. } => url,
        }
    }

    /// Return `true` if the record describes an editable install.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::LocalDirectory {
                dir_info: DirInfo {
                    editable: Some(true)
                },
                ..
            }
        )
    }
}

impl<'de> Deserialize<'de> for DirectUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Record {
            url: String,
            dir_info: Option<DirInfo>,
            vcs_info: Option<VcsInfo>,
            archive_info: Option<ArchiveInfo>,
        }

        let record = Record::deserialize(deserializer)?;
        match (record.dir_info, record.vcs_info) {
            (Some(_), Some(_)) => Err(serde::de::Error::custom(
                "direct URL record contains both `dir_info` and `vcs_info`",
            )),
            (Some(dir_info), None) => Ok(Self::LocalDirectory {
                url: record.url,
                dir_info,
            }),
            (None, Some(vcs_info)) => Ok(Self::VcsUrl {
                url: record.url,
                vcs_info,
            }),
            (None, None) => Ok(Self::ArchiveUrl {
                url: record.url,
                archive_info: record.archive_info,
            }),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirInfo {
    /// Defaults to `false` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    pub vcs: VcsKind,
    /// The commit the checkout was resolved to at install time.
    pub commit_id: String,
    /// The revision (branch, tag, or commit) the user originally requested,
    /// if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_revision: Option<String>,
}

/// The version-control system a [`VcsInfo`] record refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Bzr,
    Svn,
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git => f.write_str("git"),
            Self::Hg => f.write_str("hg"),
            Self::Bzr => f.write_str("bzr"),
            Self::Svn => f.write_str("svn"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_directory() {
        let direct_url: DirectUrl = serde_json::from_str(
            r#"{"url": "file:///home/user/project", "dir_info": {"editable": true}}"#,
        )
        .unwrap();
        assert_eq!(
            direct_url,
            DirectUrl::LocalDirectory {
                url: "file:///home/user/project".to_string(),
                dir_info: DirInfo {
                    editable: Some(true)
                },
            }
        );
        assert!(direct_url.is_editable());
    }

    #[test]
    fn local_directory_editable_defaults_to_false() {
        let direct_url: DirectUrl =
            serde_json::from_str(r#"{"url": "file:///home/user/project", "dir_info": {}}"#)
                .unwrap();
        assert!(!direct_url.is_editable());
    }

    #[test]
    fn vcs_with_requested_revision() {
        let direct_url: DirectUrl = serde_json::from_str(
            r#"{
                "url": "https://github.com/psf/requests",
                "vcs_info": {
                    "vcs": "git",
                    "commit_id": "7f694b79e114c06fac5ec06019cada5a61e5570f",
                    "requested_revision": "main"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            direct_url,
            DirectUrl::VcsUrl {
                url: "https://github.com/psf/requests".to_string(),
                vcs_info: VcsInfo {
                    vcs: VcsKind::Git,
                    commit_id: "7f694b79e114c06fac5ec06019cada5a61e5570f".to_string(),
                    requested_revision: Some("main".to_string()),
                },
            }
        );
    }

    #[test]
    fn vcs_without_requested_revision() {
        let direct_url: DirectUrl = serde_json::from_str(
            r#"{
                "url": "https://github.com/psf/requests",
                "vcs_info": {"vcs": "git", "commit_id": "7f694b79e114c06fac5ec06019cada5a61e5570f"}
            }"#,
        )
        .unwrap();
        let DirectUrl::VcsUrl { vcs_info, .. } = direct_url else {
            panic!("expected a VCS record");
        };
        assert_eq!(vcs_info.requested_revision, None);
    }

    #[test]
    fn plain_url() {
        let direct_url: DirectUrl = serde_json::from_str(
            r#"{"url": "https://example.org/archive.zip", "archive_info": {}}"#,
        )
        .unwrap();
        assert!(matches!(direct_url, DirectUrl::ArchiveUrl { .. }));
        assert_eq!(direct_url.url(), "https://example.org/archive.zip");
    }

    #[test]
    fn plain_url_without_archive_info() {
        // Absence of both `dir_info` and `vcs_info` means a plain-URL origin.
        let direct_url: DirectUrl =
            serde_json::from_str(r#"{"url": "https://example.org/archive.zip"}"#).unwrap();
        assert!(matches!(direct_url, DirectUrl::ArchiveUrl { .. }));
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(serde_json::from_str::<DirectUrl>(r#"{"dir_info": {}}"#).is_err());
    }

    #[test]
    fn unrecognized_vcs_kind_is_rejected() {
        // Must not fall through to a plain-URL origin.
        assert!(
            serde_json::from_str::<DirectUrl>(
                r#"{"url": "https://example.org/project", "vcs_info": {"vcs": "cvs", "commit_id": "abc"}}"#
            )
            .is_err()
        );
    }

    #[test]
    fn malformed_dir_info_is_rejected() {
        assert!(
            serde_json::from_str::<DirectUrl>(
                r#"{"url": "file:///home/user/project", "dir_info": {"editable": "yes"}}"#
            )
            .is_err()
        );
    }

    #[test]
    fn conflicting_origin_info_is_rejected() {
        assert!(
            serde_json::from_str::<DirectUrl>(
                r#"{
                    "url": "file:///home/user/project",
                    "dir_info": {},
                    "vcs_info": {"vcs": "git", "commit_id": "abc"}
                }"#
            )
            .is_err()
        );
    }
}
