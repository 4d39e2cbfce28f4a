//! Drives a seeding run: connect, clear, load stages in dependency order,
//! verify counts, report.
//!
//! Only connection, clear and verification failures abort a run. Row-level
//! problems are folded into each domain's [`DomainReport`].

use crate::clear::{clear_domain, ClearReport};
use crate::config::DbConfig;
use crate::domain::{Domain, HotelDomain, TrainDomain};
use crate::loader::{make_spinner, LoadOptions, Loader};
use crate::stats::{DomainReport, VerifiedCount};
use crate::store::Store;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which domains a command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainSelection {
    Train,
    Hotel,
    All,
}

impl DomainSelection {
    pub fn includes_train(self) -> bool {
        matches!(self, Self::Train | Self::All)
    }

    pub fn includes_hotel(self) -> bool {
        matches!(self, Self::Hotel | Self::All)
    }
}

/// Everything a `seed` run needs besides the store itself.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub domains: DomainSelection,
    pub fixtures: PathBuf,
    pub init_schema: bool,
    pub load: LoadOptions,
}

/// Connects, seeds every selected domain, and closes the pool whatever the outcome.
pub async fn run_seed(db: &DbConfig, plan: &SeedPlan) -> Result<Vec<DomainReport>> {
    info!("Connecting to {} ...", db.display_target());
    let store = Store::connect(db).await?;
    let result = seed(&store, plan).await;
    store.close().await;
    result
}

/// Seeds the selected domains on an already connected store, train first.
pub async fn seed(store: &Store, plan: &SeedPlan) -> Result<Vec<DomainReport>> {
    if plan.init_schema {
        store.ensure_schema().await?;
    }

    let mut reports = Vec::new();
    if plan.domains.includes_train() {
        reports.push(run_domain::<TrainDomain>(store, &plan.fixtures, &plan.load).await?);
    }
    if plan.domains.includes_hotel() {
        reports.push(run_domain::<HotelDomain>(store, &plan.fixtures, &plan.load).await?);
    }
    Ok(reports)
}

/// Connects, clears the selected domains without reloading, and closes the pool.
pub async fn run_clear(
    db: &DbConfig,
    domains: DomainSelection,
    progress: bool,
) -> Result<Vec<(&'static str, ClearReport)>> {
    let store = Store::connect(db).await?;
    let result = clear(&store, domains, progress).await;
    store.close().await;
    result
}

pub async fn clear(
    store: &Store,
    domains: DomainSelection,
    progress: bool,
) -> Result<Vec<(&'static str, ClearReport)>> {
    let opts = LoadOptions {
        progress,
        ..LoadOptions::default()
    };
    let loader = Loader::new(store.clone(), opts);

    let mut reports = Vec::new();
    if domains.includes_train() {
        reports.push((TrainDomain::NAME, clear_only::<TrainDomain>(&loader).await?));
    }
    if domains.includes_hotel() {
        reports.push((HotelDomain::NAME, clear_only::<HotelDomain>(&loader).await?));
    }
    Ok(reports)
}

/// Connects and creates any missing table.
pub async fn run_init_schema(db: &DbConfig) -> Result<()> {
    let store = Store::connect(db).await?;
    let result = store.ensure_schema().await;
    store.close().await;
    result
}

async fn clear_only<D: Domain>(loader: &Loader) -> Result<ClearReport> {
    let pb = loader
        .progress()
        .add(make_spinner(&format!("Clearing {} ...", D::NAME)));
    let report = clear_domain(loader.store(), D::NAME, D::clear_plan(), &pb).await?;
    pb.finish_with_message(format!(
        "Cleared {}: {} rows removed",
        D::NAME,
        report.total_removed()
    ));
    Ok(report)
}

/// Runs one domain end to end on `store`.
pub async fn run_domain<D: Domain>(
    store: &Store,
    fixtures_root: &Path,
    opts: &LoadOptions,
) -> Result<DomainReport> {
    let start = Instant::now();
    let fixtures = D::read_fixtures(fixtures_root);
    let rows = D::fixture_rows(&fixtures);
    if rows == 0 {
        warn!(
            domain = D::NAME,
            fixtures = %fixtures_root.display(),
            "No fixture rows found; existing rows will still be cleared"
        );
    } else {
        info!(domain = D::NAME, rows, "Fixtures read");
    }

    let loader = Loader::new(store.clone(), opts.clone());
    let mut report = DomainReport::new(D::NAME);
    report.cleared = clear_only::<D>(&loader)
        .await
        .with_context(|| format!("Clearing {} aborted", D::NAME))?;

    for stage in D::stages() {
        debug!(domain = D::NAME, entity = %stage.entity, phase = ?stage.phase, "Starting stage");
        let result = (stage.load)(&loader, &fixtures).await;
        let input = D::input_rows(&fixtures, stage.entity) as u64;

        if input > 0 && !result.any_succeeded() && result.skipped < input {
            warn!(
                domain = D::NAME,
                entity = %stage.entity,
                "No {} rows were inserted",
                stage.entity.label()
            );
        } else if result.error > 0 {
            warn!(
                domain = D::NAME,
                entity = %stage.entity,
                errors = result.error,
                "Some {} rows failed to insert",
                stage.entity.label()
            );
        }
        report.stages.push((stage.entity, result));
    }

    for query in D::verify_queries() {
        let rows = store
            .count(query.entity.table(), query.scope)
            .await
            .with_context(|| format!("Verification of {} failed", query.entity.table()))?;
        let inserted = report.result_for(query.entity).map_or(0, |r| r.success);
        if (rows.max(0) as u64) < inserted {
            warn!(
                domain = D::NAME,
                entity = %query.entity,
                rows,
                inserted,
                "Stored row count is lower than rows inserted"
            );
        }
        report.verified.push(VerifiedCount {
            entity: query.entity,
            rows,
        });
    }

    info!(
        domain = D::NAME,
        duration_secs = start.elapsed().as_secs_f64(),
        "Domain seeded: {}",
        report.totals()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entity;
    use crate::stats::LoadResult;
    use crate::store::test_support::{temp_store, temp_store_with_schema};
    use tempfile::TempDir;

    fn quiet() -> LoadOptions {
        LoadOptions {
            progress: false,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn selection_membership() {
        assert!(DomainSelection::All.includes_train());
        assert!(DomainSelection::All.includes_hotel());
        assert!(DomainSelection::Train.includes_train());
        assert!(!DomainSelection::Train.includes_hotel());
        assert!(!DomainSelection::Hotel.includes_train());
    }

    #[tokio::test]
    async fn builtin_hotels_seed_and_verify() {
        let store_dir = TempDir::new().unwrap();
        let fixtures = TempDir::new().unwrap();
        let store = temp_store_with_schema(&store_dir).await;

        let report = run_domain::<HotelDomain>(&store, fixtures.path(), &quiet())
            .await
            .unwrap();

        assert_eq!(
            report.result_for(Entity::Room),
            Some(LoadResult { success: 8, error: 0, skipped: 0 })
        );
        assert_eq!(report.verified_rows(Entity::Accommodation), Some(2));
        assert_eq!(report.verified_rows(Entity::Room), Some(8));
        assert_eq!(report.verified_rows(Entity::Photo), Some(8));
        store.close().await;
    }

    #[tokio::test]
    async fn missing_schema_is_fatal() {
        let store_dir = TempDir::new().unwrap();
        let fixtures = TempDir::new().unwrap();
        let store = temp_store(&store_dir).await;

        let err = run_domain::<TrainDomain>(&store, fixtures.path(), &quiet())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Clearing train aborted"));
        store.close().await;
    }

    #[tokio::test]
    async fn init_schema_flag_creates_tables() {
        let store_dir = TempDir::new().unwrap();
        let fixtures = TempDir::new().unwrap();
        let store = temp_store(&store_dir).await;

        let plan = SeedPlan {
            domains: DomainSelection::All,
            fixtures: fixtures.path().to_path_buf(),
            init_schema: true,
            load: quiet(),
        };
        let reports = seed(&store, &plan).await.unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.domain).collect();
        assert_eq!(names, vec!["train", "hotel"]);
        // no train fixtures: stages ran on empty input
        assert_eq!(reports[0].totals(), LoadResult::default());
        store.close().await;
    }
}
