use crate::store::Store;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info};

/// One table of a domain's clear plan and the WHERE clause scoping it to the domain.
#[derive(Debug, Clone, Copy)]
pub struct ClearStep {
    pub table: &'static str,
    pub scope: &'static str,
}

impl ClearStep {
    pub const fn new(table: &'static str, scope: &'static str) -> Self {
        Self { table, scope }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearedTable {
    pub table: &'static str,
    pub removed: u64,
}

/// Tables emptied by a clear, in the order they were emptied.
#[derive(Debug, Clone, Default)]
pub struct ClearReport {
    pub tables: Vec<ClearedTable>,
}

impl ClearReport {
    pub fn total_removed(&self) -> u64 {
        self.tables.iter().map(|t| t.removed).sum()
    }
}

/// Deletes a domain's rows, walking `plan` from children to parents.
///
/// Tables with no rows in scope are skipped. The first failing count or delete
/// aborts the clear: later steps would only hit foreign-key violations.
pub async fn clear_domain(
    store: &Store,
    domain: &str,
    plan: &[ClearStep],
    pb: &ProgressBar,
) -> Result<ClearReport> {
    let mut report = ClearReport::default();

    for step in plan {
        pb.set_message(format!("Clearing {domain}: {} ...", step.table));

        let count = store
            .count(step.table, Some(step.scope))
            .await
            .with_context(|| format!("Failed to count {} rows before clearing", step.table))?;

        if count == 0 {
            debug!(table = step.table, "Nothing to clear");
            continue;
        }

        let sql = format!("DELETE FROM {} WHERE {}", step.table, step.scope);
        let result = store
            .execute(&sql)
            .await
            .with_context(|| format!("Failed to clear {} for domain {domain}", step.table))?;

        let removed = result.rows_affected();
        info!(table = step.table, removed, "Cleared existing rows");
        report.tables.push(ClearedTable {
            table: step.table,
            removed,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store_with_schema;
    use tempfile::TempDir;

    const PLAN: &[ClearStep] = &[
        ClearStep::new("amenity_map", "1 = 1"),
        ClearStep::new("amenity", "1 = 1"),
    ];

    const WRONG_ORDER: &[ClearStep] = &[
        ClearStep::new("amenity", "1 = 1"),
        ClearStep::new("amenity_map", "1 = 1"),
    ];

    async fn seed(store: &Store) {
        for sql in [
            "INSERT INTO address (address_id, street, city, state, country, pincode) \
             VALUES (X'000000000000000000000000000000A1', 's', 'c', 'st', 'co', 'p')",
            "INSERT INTO accommodation (accommodation_id, type, name, rating, status, address_id) \
             VALUES (X'000000000000000000000000000000B1', 'hotel', 'H', 4.0, 'active', X'000000000000000000000000000000A1')",
            "INSERT INTO amenity (amenity_id, name) VALUES (X'000000000000000000000000000000C1', 'Pool')",
            "INSERT INTO amenity (amenity_id, name) VALUES (X'000000000000000000000000000000C2', 'Spa')",
            "INSERT INTO amenity_map (accommodation_id, amenity_id) \
             VALUES (X'000000000000000000000000000000B1', X'000000000000000000000000000000C1')",
        ] {
            store.execute(sql).await.unwrap();
        }
    }

    #[tokio::test]
    async fn clears_children_then_parents() {
        let dir = TempDir::new().unwrap();
        let store = temp_store_with_schema(&dir).await;
        seed(&store).await;

        let report = clear_domain(&store, "test", PLAN, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(
            report.tables,
            vec![
                ClearedTable { table: "amenity_map", removed: 1 },
                ClearedTable { table: "amenity", removed: 2 },
            ]
        );
        assert_eq!(report.total_removed(), 3);
        assert_eq!(store.count("amenity", None).await.unwrap(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn empty_tables_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = temp_store_with_schema(&dir).await;
        let report = clear_domain(&store, "test", PLAN, &ProgressBar::hidden())
            .await
            .unwrap();
        assert!(report.tables.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn foreign_key_violation_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = temp_store_with_schema(&dir).await;
        seed(&store).await;

        let err = clear_domain(&store, "test", WRONG_ORDER, &ProgressBar::hidden())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to clear amenity"));
        // nothing after the failing step ran
        assert_eq!(store.count("amenity_map", None).await.unwrap(), 1);
        store.close().await;
    }
}
