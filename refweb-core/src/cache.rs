// Persistent (name, depth) -> graph cache

use crate::data::Store;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use refweb_graph::{Edge, Graph, Node};
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub name: String,
    pub depth: u32,
    pub document_nodes: Vec<Node>,
    pub comment_nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Fresh entries were written on the same UTC calendar day as `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.updated_at.date_naive() == now.date_naive()
    }
}

#[derive(Clone)]
pub struct GraphCache {
    store: Arc<Store>,
}

impl GraphCache {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Single keyed lookup; a miss is `Ok(None)`
    pub fn get(&self, name: &str, depth: u32) -> Result<Option<CacheEntry>> {
        let row = self.store.run(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT document_nodes, comment_nodes, edges, created_at, updated_at
                 FROM connected_documents WHERE name = ?1 AND depth = ?2",
            )?;
            let row = stmt
                .query_row(params![name, depth], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .optional()?;
            Ok(row)
        })?;

        let Some((documents, comments, edges, created_at, updated_at)) = row else {
            debug!("Cache miss for ({}, {})", name, depth);
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            name: name.to_string(),
            depth,
            document_nodes: serde_json::from_str(&documents)?,
            comment_nodes: serde_json::from_str(&comments)?,
            edges: serde_json::from_str(&edges)?,
            created_at: timestamp(created_at)?,
            updated_at: timestamp(updated_at)?,
        }))
    }

    /// Insert or overwrite the entry for (name, depth) in one statement.
    /// Returns the refreshed `updated_at`.
    pub fn put(&self, name: &str, depth: u32, graph: &Graph) -> Result<DateTime<Utc>> {
        let documents = serde_json::to_string(&graph.document_nodes())?;
        let comments = serde_json::to_string(&graph.comment_nodes())?;
        let edges = serde_json::to_string(&graph.edges)?;

        let updated_at: i64 = self.store.write(|tx| {
            let updated_at = tx.query_row(
                "INSERT INTO connected_documents (name, depth, document_nodes, comment_nodes, edges)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(name, depth) DO UPDATE SET
                    document_nodes = excluded.document_nodes,
                    comment_nodes = excluded.comment_nodes,
                    edges = excluded.edges,
                    updated_at = CAST(strftime('%s', 'now') AS INTEGER)
                 RETURNING updated_at",
                params![name, depth, &documents, &comments, &edges],
                |row| row.get(0),
            )?;
            Ok(updated_at)
        })?;

        debug!("Cached ({}, {}) at {}", name, depth, updated_at);
        timestamp(updated_at)
    }

    /// Only the comment-node slice of an entry
    pub fn comments(&self, name: &str, depth: u32) -> Result<Option<Vec<Node>>> {
        let raw: Option<String> = self.store.run(|conn| {
            let raw = conn
                .query_row(
                    "SELECT comment_nodes FROM connected_documents WHERE name = ?1 AND depth = ?2",
                    params![name, depth],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw)
        })?;

        raw.map(|json| serde_json::from_str(&json).map_err(CoreError::from))
            .transpose()
    }

    /// Delete entries whose name contains any of `terms`, case-insensitively.
    /// Matching uses the same Unicode case folding as population candidates.
    pub fn purge_matching(&self, terms: &[String]) -> Result<usize> {
        let terms = denylist_terms(terms);
        if terms.is_empty() {
            return Ok(0);
        }

        let removed = self.store.write(|tx| {
            let rows = {
                let mut stmt = tx.prepare("SELECT id, name FROM connected_documents")?;
                stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };

            let mut delete = tx.prepare_cached("DELETE FROM connected_documents WHERE id = ?1")?;
            let mut removed = 0;
            for (id, name) in rows {
                if is_denylisted(&name, &terms) {
                    removed += delete.execute(params![id])?;
                }
            }
            Ok(removed)
        })?;

        debug!("Purged {} cache entries", removed);
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        self.store.run(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM connected_documents", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| CoreError::Config(format!("stored timestamp {} is out of range", secs)))
}

/// Lowercased, trimmed, non-empty denylist terms
pub fn denylist_terms(denylist: &[String]) -> Vec<String> {
    denylist
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether `name` contains any of the prepared `terms`, ignoring case
pub fn is_denylisted(name: &str, terms: &[String]) -> bool {
    let lowered = name.to_lowercase();
    terms.iter().any(|t| lowered.contains(t.as_str()))
}
