//! travel-seed: bulk inventory loader for a travel booking store
//!
//! Seeds the transport (vehicles, trains, stations, route legs, coaches,
//! seats) and accommodation (addresses, hotels, rooms, photos, amenities)
//! tables from fixture files, keeping referential integrity intact.
//!
//! A run per domain is a fixed sequence:
//!
//! 1. **Clear** -- Delete the domain's rows from children to parents so no
//!    foreign key is ever violated. Shared stations and amenities are kept.
//! 2. **Load** -- Insert each entity type in dependency order, in batches.
//!    Natural-key entities skip ids that are already stored, soft foreign
//!    keys are checked before insert, and a failing row never stops the run.
//! 3. **Verify** -- Count what the store holds for the domain and compare it
//!    with what was inserted.
//!
//! # Key Modules
//!
//! - [`orchestrator`] -- Connect, clear, load, verify, report
//! - [`domain`] -- Per-domain clear plans, stage lists and inserters
//! - [`loader`] -- Batch loading with skip/insert/check policies
//! - [`probe`] -- Batched existence checks for natural-key ids
//! - [`clear`] -- Dependency-ordered deletion
//! - [`fixtures`] -- CSV (plain or bz2) and JSON fixture reading
//! - [`codec`] -- Dashed UUID and compact storage id conversion
//! - [`store`] -- Connection pool handle
//! - [`schema`] -- Table definitions
//! - [`ratelog`] -- First-N rate-limited logging
//! - [`stats`] -- Per-entity and per-domain counters
//! - [`models`] -- Fixture row types
//! - [`config`] -- Defaults and tuning constants
//!
//! # Example Usage
//!
//! ```bash
//! # Create tables, then seed both domains
//! travel-seed seed --domain all --fixtures fixtures/ --init-schema -v
//!
//! # Remove hotel inventory only
//! travel-seed clear --domain hotel
//! ```

pub mod clear;
pub mod codec;
pub mod config;
pub mod domain;
pub mod fixtures;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod ratelog;
pub mod schema;
pub mod stats;
pub mod store;
