use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

/// One package-version as stored.
///
/// `(id, version)` is the composite key; the owning side of the author,
/// tag and dependency child rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub version: String,
    pub created: UtcDateTime,
    pub download_count: i64,
    pub is_latest: bool,
    pub is_absolute_latest: bool,
    pub is_prerelease: bool,
}

/// A directed dependency edge from a package-version to another package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub dependency_id: String,
    pub dependency_version: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    pub(crate) id: String,
    pub(crate) version: String,
    pub(crate) created_at: i64,
    pub(crate) download_count: i64,
    pub(crate) is_latest: bool,
    pub(crate) is_absolute_latest: bool,
    pub(crate) is_prerelease: bool,
}

impl From<&Package> for PackageRow {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.clone(),
            version: package.version.clone(),
            created_at: package.created.unix_timestamp(),
            download_count: package.download_count,
            is_latest: package.is_latest,
            is_absolute_latest: package.is_absolute_latest,
            is_prerelease: package.is_prerelease,
        }
    }
}
impl TryFrom<PackageRow> for Package {
    type Error = Error;
    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            version: row.version,
            created: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("created timestamp"))?,
            download_count: row.download_count,
            is_latest: row.is_latest,
            is_absolute_latest: row.is_absolute_latest,
            is_prerelease: row.is_prerelease,
        })
    }
}
