//! Batch loader.
//!
//! Inserts one entity's fixture rows batch by batch, one awaited statement at
//! a time. A failing row is counted and logged (rate-limited) and the run
//! moves on; nothing here aborts a load.

use crate::config::{BATCH_SIZE, LOG_FIRST_N, PROBE_BATCH_SIZE};
use crate::domain::Entity;
use crate::models::FixtureRow;
use crate::probe;
use crate::ratelog::FirstN;
use crate::stats::LoadResult;
use crate::store::Store;
use anyhow::Result;
use futures::future::BoxFuture;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rustc_hash::FxHashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Inserts a single fixture row.
pub type InsertFn<R> = for<'a> fn(&'a Store, &'a R) -> BoxFuture<'a, Result<()>>;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Rows per batch; pacing and logging only, never a transaction.
    pub batch_size: usize,
    /// Ids per existence probe query.
    pub probe_batch_size: usize,
    /// Detailed error/skip lines per entity before suppression.
    pub log_limit: u32,
    pub progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            probe_batch_size: PROBE_BATCH_SIZE,
            log_limit: LOG_FIRST_N,
            progress: true,
        }
    }
}

pub struct Loader {
    store: Store,
    opts: LoadOptions,
    progress: MultiProgress,
}

impl Loader {
    pub fn new(store: Store, opts: LoadOptions) -> Self {
        let progress = if opts.progress {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            store,
            opts,
            progress,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn progress(&self) -> &MultiProgress {
        &self.progress
    }

    fn begin(&self, entity: Entity, total: usize) -> EntityLoad {
        let pb = self
            .progress
            .add(make_progress_bar(total as u64, entity.label()));
        EntityLoad {
            entity,
            result: LoadResult::new(),
            errors: FirstN::new(self.opts.log_limit),
            skips: FirstN::new(self.opts.log_limit),
            pb,
        }
    }

    fn batches<'r, R>(&self, rows: &'r [R]) -> impl Iterator<Item = (usize, &'r [R])> {
        rows.chunks(self.opts.batch_size.max(1)).enumerate()
    }

    fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.opts.batch_size.max(1))
    }

    /// Natural-key entities: rows whose id is already stored, or already
    /// inserted earlier in this run, are skipped.
    pub async fn load_natural<R>(&self, entity: Entity, rows: &[R], insert: InsertFn<R>) -> LoadResult
    where
        R: FixtureRow + Sync,
    {
        let mut load = self.begin(entity, rows.len());
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let batches = self.batch_count(rows.len());

        for (i, batch) in self.batches(rows) {
            debug!(entity = %entity, batch = i + 1, batches, rows = batch.len(), "Processing batch");

            let candidates: Vec<&str> = batch.iter().map(|r| r.id()).collect();
            let existing = probe::existing_ids(
                &self.store,
                entity,
                &candidates,
                self.opts.probe_batch_size,
            )
            .await;

            for row in batch {
                let key = probe::canonical(row.id());
                if existing.contains(&key) {
                    debug!(entity = %entity, id = row.id(), "Already present, skipping");
                    load.skip();
                } else if !seen.insert(key) {
                    debug!(entity = %entity, id = row.id(), "Duplicate fixture row, skipping");
                    load.skip();
                } else {
                    load.insert(&self.store, row, insert).await;
                }
            }
        }

        load.finish()
    }

    /// Rows that always belong to a freshly loaded parent: insert every one.
    pub async fn load_unconditional<R>(
        &self,
        entity: Entity,
        rows: &[R],
        insert: InsertFn<R>,
    ) -> LoadResult
    where
        R: FixtureRow + Sync,
    {
        let mut load = self.begin(entity, rows.len());
        let batches = self.batch_count(rows.len());

        for (i, batch) in self.batches(rows) {
            debug!(entity = %entity, batch = i + 1, batches, rows = batch.len(), "Processing batch");
            for row in batch {
                load.insert(&self.store, row, insert).await;
            }
        }

        load.finish()
    }

    /// Rows with a soft foreign key: a reference missing from `valid` is
    /// skipped, not inserted.
    pub async fn load_checked<R>(
        &self,
        entity: Entity,
        rows: &[R],
        valid: &FxHashSet<String>,
        reference: fn(&R) -> &str,
        insert: InsertFn<R>,
    ) -> LoadResult
    where
        R: FixtureRow + Sync,
    {
        let mut load = self.begin(entity, rows.len());
        let batches = self.batch_count(rows.len());

        for (i, batch) in self.batches(rows) {
            debug!(entity = %entity, batch = i + 1, batches, rows = batch.len(), "Processing batch");
            for row in batch {
                let target = reference(row);
                if valid.contains(&probe::canonical(target)) {
                    load.insert(&self.store, row, insert).await;
                } else {
                    load.skip_invalid(row.id(), target);
                }
            }
        }

        load.finish()
    }
}

/// Per-entity counters, diagnostics and progress for one loader call.
struct EntityLoad {
    entity: Entity,
    result: LoadResult,
    errors: FirstN,
    skips: FirstN,
    pb: ProgressBar,
}

impl EntityLoad {
    async fn insert<R>(&mut self, store: &Store, row: &R, insert: InsertFn<R>)
    where
        R: FixtureRow,
    {
        match insert(store, row).await {
            Ok(()) => self.result.inc_success(),
            Err(e) => {
                self.result.inc_error();
                self.errors.warn(
                    self.entity.table(),
                    format!("Insert failed for {}: {e:#}", row.id()),
                );
            }
        }
        self.pb.inc(1);
    }

    fn skip(&mut self) {
        self.result.inc_skipped();
        self.pb.inc(1);
    }

    fn skip_invalid(&mut self, id: &str, reference: &str) {
        self.result.inc_skipped();
        self.skips.info(
            self.entity.table(),
            format!("Skipping {id}: references missing row {reference}"),
        );
        self.pb.inc(1);
    }

    fn finish(self) -> LoadResult {
        let table = self.entity.table();
        self.errors.summarize(table, "errors");
        self.skips.summarize(table, "invalid references");
        let summary = format!("{}: {}", self.entity.label(), self.result);
        info!(
            entity = %self.entity,
            success = self.result.success,
            error = self.result.error,
            skipped = self.result.skipped,
            "{summary}"
        );
        self.pb.finish_with_message(summary);
        self.result
    }
}

pub(crate) fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn make_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "    {{spinner:.cyan}} {label:<14} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} rows {{msg}}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
