//! Existence probing for natural-key entities.
//!
//! Read-only. Failures are logged and treated as "nothing exists": the loader
//! then attempts the inserts and the store rejects any real duplicates.

use crate::codec;
use crate::domain::Entity;
use crate::store::Store;
use anyhow::{Context, Result};
use futures::TryStreamExt;
use rustc_hash::FxHashSet;
use sqlx::Row;
use tracing::{debug, warn};

/// Subset of `candidates` already stored for `entity`, as lowercase dashed ids.
///
/// Queries at most `batch_size` ids at a time.
pub async fn existing_ids(
    store: &Store,
    entity: Entity,
    candidates: &[&str],
    batch_size: usize,
) -> FxHashSet<String> {
    match probe(store, entity, candidates, batch_size.max(1)).await {
        Ok(found) => {
            debug!(
                entity = %entity,
                candidates = candidates.len(),
                existing = found.len(),
                "Existence probe"
            );
            found
        }
        Err(e) => {
            warn!(entity = %entity, error = %format!("{e:#}"), "Existence probe failed, assuming none exist");
            FxHashSet::default()
        }
    }
}

async fn probe(
    store: &Store,
    entity: Entity,
    candidates: &[&str],
    batch_size: usize,
) -> Result<FxHashSet<String>> {
    let keys: Vec<Vec<u8>> = candidates
        .iter()
        .filter_map(|id| codec::to_bytes(id).ok())
        .collect();

    let mut found = FxHashSet::default();
    for chunk in keys.chunks(batch_size) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT HEX({col}) AS id FROM {table} WHERE {col} IN ({placeholders})",
            col = entity.key_column(),
            table = entity.table(),
        );
        let mut query = sqlx::query(&sql);
        for key in chunk {
            query = query.bind(key.clone());
        }
        let rows = query
            .fetch_all(store.pool())
            .await
            .with_context(|| format!("Failed to execute: {sql}"))?;
        for row in rows {
            let hex: String = row.try_get("id").context("Missing 'id' field in result")?;
            found.insert(codec::to_dashed(&hex));
        }
    }
    Ok(found)
}

/// Every stored id of `entity`, optionally narrowed by a WHERE clause.
///
/// Used to validate soft foreign keys; fails open to an empty set like
/// [`existing_ids`].
pub async fn all_ids(store: &Store, entity: Entity, scope: Option<&str>) -> FxHashSet<String> {
    let sql = match scope {
        Some(scope) => format!(
            "SELECT HEX({col}) AS id FROM {table} WHERE {scope}",
            col = entity.key_column(),
            table = entity.table(),
        ),
        None => format!(
            "SELECT HEX({col}) AS id FROM {table}",
            col = entity.key_column(),
            table = entity.table(),
        ),
    };

    let mut ids = FxHashSet::default();
    let mut rows = sqlx::query(&sql).fetch(store.pool());
    loop {
        match rows.try_next().await {
            Ok(Some(row)) => match row.try_get::<String, _>("id") {
                Ok(hex) => {
                    ids.insert(codec::to_dashed(&hex));
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "Unreadable id, assuming none exist");
                    return FxHashSet::default();
                }
            },
            Ok(None) => break,
            Err(e) => {
                warn!(entity = %entity, error = %e, "Id lookup failed, assuming none exist");
                return FxHashSet::default();
            }
        }
    }
    debug!(entity = %entity, ids = ids.len(), "Loaded valid ids");
    ids
}

/// Lowercase dashed form used as the key of every id set.
pub fn canonical(id: &str) -> String {
    codec::to_dashed(&codec::to_storage(id.trim()))
}
