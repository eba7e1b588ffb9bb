//! Edge queries against the package store.

use crate::builder::{Edge, EdgeSource};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use pkgsync_store::Database;
use sqlx::QueryBuilder;

#[async_trait]
impl EdgeSource for Database {
    async fn dependents_of(&self, ids: &[String]) -> Result<Vec<Edge>> {
        fetch_edges(self, "dependency_id", ids).await
    }

    async fn dependencies_of(&self, ids: &[String]) -> Result<Vec<Edge>> {
        fetch_edges(self, "id", ids).await
    }
}

/// Select distinct identifier-level edges where `column` matches any of
/// `ids`. The dependencies table is keyed per package-version, so the
/// same identifier pair can appear many times; DISTINCT collapses it to
/// one graph edge.
async fn fetch_edges(db: &Database, column: &str, ids: &[String]) -> Result<Vec<Edge>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<sqlx::Sqlite> =
        QueryBuilder::new("SELECT DISTINCT id, dependency_id FROM dependencies WHERE ");
    builder.push(column).push(" IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(id);
    }
    builder.push(")");
    let rows: Vec<(String, String)> = builder
        .build_query_as()
        .fetch_all(db.pool())
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(rows.into_iter().map(|(from, to)| Edge { from, to }).collect())
}
