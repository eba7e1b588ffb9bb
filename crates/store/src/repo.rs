//! Repository for package-versions and their child rows.
//!
//! A package-version and its authors, tags and dependency edges live and
//! die together: every refresh rewrites the children inside the same
//! transaction that touches the parent, which is what makes reprocessing
//! an already-seen feed record safe.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{DependencyEdge, Package, PackageRow};
use exn::ResultExt;
use sqlx::SqlitePool;

/// Repository for managing package-version rows in the store.
#[derive(Debug, Clone)]
pub struct PackageRepository {
    pool: SqlitePool,
}
impl From<&Database> for PackageRepository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl PackageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a package by its (id, version) key.
    pub async fn get(&self, id: impl AsRef<str>, version: impl AsRef<str>) -> Result<Option<Package>> {
        let row: Option<PackageRow> = sqlx::query_as(include_str!("../queries/get_package.sql"))
            .bind(id.as_ref())
            .bind(version.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Package::try_from).transpose()
    }

    /// Insert or update a package-version and rewrite all of its child rows.
    ///
    /// The package row is upserted: an existing row keeps its created
    /// timestamp and only refreshes the download count and the three
    /// latest/prerelease flags. Authors, tags and dependency edges are
    /// always deleted and reinserted, all inside one transaction, so the
    /// stored child set is exactly the given one no matter how many times
    /// the same record is applied.
    pub async fn replace(
        &self,
        package: &Package,
        authors: &[String],
        tags: &[String],
        dependencies: &[DependencyEdge],
    ) -> Result<()> {
        let row = PackageRow::from(package);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/upsert_package.sql"))
            .bind(&row.id)
            .bind(&row.version)
            .bind(row.created_at)
            .bind(row.download_count)
            .bind(row.is_latest)
            .bind(row.is_absolute_latest)
            .bind(row.is_prerelease)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for query in [
            include_str!("../queries/delete_authors.sql"),
            include_str!("../queries/delete_tags.sql"),
            include_str!("../queries/delete_dependencies.sql"),
        ] {
            sqlx::query(query).bind(&row.id).bind(&row.version).execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        }
        for author in authors {
            sqlx::query(include_str!("../queries/insert_author.sql"))
                .bind(&row.id)
                .bind(&row.version)
                .bind(author)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for tag in tags {
            sqlx::query(include_str!("../queries/insert_tag.sql"))
                .bind(&row.id)
                .bind(&row.version)
                .bind(tag)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for dependency in dependencies {
            sqlx::query(include_str!("../queries/insert_dependency.sql"))
                .bind(&row.id)
                .bind(&row.version)
                .bind(&dependency.dependency_id)
                .bind(&dependency.dependency_version)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Delete a package-version and all of its child rows.
    ///
    /// Used for unlisted records. Child rows are removed even when no
    /// package row exists, in case an earlier partial write left strays.
    /// Returns `true` if a package row was deleted.
    pub async fn remove(&self, id: impl AsRef<str>, version: impl AsRef<str>) -> Result<bool> {
        let id = id.as_ref();
        let version = version.as_ref();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for query in [
            include_str!("../queries/delete_authors.sql"),
            include_str!("../queries/delete_tags.sql"),
            include_str!("../queries/delete_dependencies.sql"),
        ] {
            sqlx::query(query).bind(id).bind(version).execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        }
        let result = sqlx::query(include_str!("../queries/delete_package.sql"))
            .bind(id)
            .bind(version)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all package-version rows.
    pub async fn count_packages(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_packages.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("package count"))
    }

    /// List the stored author names for a package-version, insertion order.
    pub async fn list_authors(&self, id: impl AsRef<str>, version: impl AsRef<str>) -> Result<Vec<String>> {
        self.list_names(include_str!("../queries/list_authors.sql"), id.as_ref(), version.as_ref()).await
    }

    /// List the stored tag names for a package-version, insertion order.
    pub async fn list_tags(&self, id: impl AsRef<str>, version: impl AsRef<str>) -> Result<Vec<String>> {
        self.list_names(include_str!("../queries/list_tags.sql"), id.as_ref(), version.as_ref()).await
    }

    /// List the stored dependency edges for a package-version, insertion order.
    pub async fn list_dependencies(
        &self,
        id: impl AsRef<str>,
        version: impl AsRef<str>,
    ) -> Result<Vec<DependencyEdge>> {
        let rows: Vec<(String, String)> = sqlx::query_as(include_str!("../queries/list_dependencies.sql"))
            .bind(id.as_ref())
            .bind(version.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows
            .into_iter()
            .map(|(dependency_id, dependency_version)| DependencyEdge { dependency_id, dependency_version })
            .collect())
    }

    async fn list_names(&self, query: &str, id: &str, version: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(query)
            .bind(id)
            .bind(version)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
