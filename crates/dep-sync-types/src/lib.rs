//! Data types for the installed distributions within a Python environment:
//! the `.dist-info` record itself, the core-metadata subset relevant to
//! dependency satisfaction, and the `direct_url.json` origin record.

pub use crate::direct_url::{ArchiveInfo, DirInfo, DirectUrl, VcsInfo, VcsKind};
pub use crate::installed::{InstalledDist, InstalledDistError};
pub use crate::metadata::{Metadata, MetadataError};

mod direct_url;
mod installed;
mod metadata;
