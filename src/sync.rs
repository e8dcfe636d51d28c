//! Sync orchestrator: drives discovery across all product families.
//!
//! The orchestrator sequences ensure-family-definitions, the per-family
//! crawl planners, and the optional missing-image backfill, and aggregates
//! the per-family counts into a [`SyncSummary`]. A whole-catalog sync and a
//! single-family sync share the same per-family routine; the difference is
//! only which families are invoked.
//!
//! A failure inside one family's processing aborts the whole run. Work
//! already committed by earlier families (and by the failing family before
//! the error) remains in the catalog, so an aborted run is partially applied
//! but never partially corrupt.

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::catalog::{Catalog, CatalogError, ReconcileOutcome};
use crate::crawl::{
    FamilyConfig, FamilyCrawl, SyncOptions, Topology, crawl_fixed, crawl_gridded, crawl_periodic,
};
use crate::fetch::{HttpFetcher, LISTING_PAUSE, RateLimiter};
use crate::materialize::{ImageRef, MaterializeOutcome, materialize};

/// Errors that can abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested family name is not in the configured set.
    #[error("unknown product family: {0}")]
    UnknownFamily(String),

    /// A catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Per-family counters accumulated during one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FamilyCounts {
    /// Decoded files handed to the reconciler.
    pub files_seen: u64,
    /// Products created on first discovery.
    pub products_created: u64,
    /// Products whose remote URL was refreshed in place.
    pub products_updated: u64,
    /// New valid-time records inserted.
    pub valid_times_created: u64,
    /// Images fetched and stored locally.
    pub images_downloaded: u64,
    /// Images the server reported missing (HTTP 404).
    pub images_missing: u64,
    /// Image fetches that failed transiently.
    pub images_failed: u64,
}

impl FamilyCounts {
    /// Folds one reconciliation outcome into the counters.
    pub(crate) fn record_reconcile(&mut self, outcome: &ReconcileOutcome) {
        self.files_seen += 1;
        if outcome.product_created {
            self.products_created += 1;
        } else {
            self.products_updated += 1;
        }
        if outcome.valid_time_created {
            self.valid_times_created += 1;
        }
    }

    /// Folds one materialization outcome into the counters.
    pub(crate) fn record_image(&mut self, outcome: &MaterializeOutcome) {
        match outcome {
            MaterializeOutcome::Downloaded(_) => self.images_downloaded += 1,
            MaterializeOutcome::NotFound => self.images_missing += 1,
            MaterializeOutcome::TransientFailure => self.images_failed += 1,
            MaterializeOutcome::AlreadyPresent => {}
        }
    }

    /// Adds another counter set into this one.
    pub fn merge(&mut self, other: &Self) {
        self.files_seen += other.files_seen;
        self.products_created += other.products_created;
        self.products_updated += other.products_updated;
        self.valid_times_created += other.valid_times_created;
        self.images_downloaded += other.images_downloaded;
        self.images_missing += other.images_missing;
        self.images_failed += other.images_failed;
    }
}

/// One family's counters within a run summary.
#[derive(Debug, Clone, Serialize)]
pub struct FamilySummary {
    /// The family name.
    pub family: String,
    /// The family's counters.
    pub counts: FamilyCounts,
}

/// Structured summary of one sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    /// Per-family counters, in processing order.
    pub families: Vec<FamilySummary>,
    /// Images fetched by the trailing missing-image backfill pass.
    pub backfill_downloaded: u64,
    /// Backfill fetches the server reported missing.
    pub backfill_missing: u64,
    /// Backfill fetches that failed transiently.
    pub backfill_failed: u64,
}

impl SyncSummary {
    /// Sums the per-family counters.
    #[must_use]
    pub fn totals(&self) -> FamilyCounts {
        let mut totals = FamilyCounts::default();
        for family in &self.families {
            totals.merge(&family.counts);
        }
        totals
    }
}

/// Top-level driver for catalog synchronization.
///
/// Owns the HTTP fetcher, the per-host rate limiter, the catalog handle,
/// and the per-family configuration; one instance serves a whole run.
#[derive(Debug)]
pub struct Synchronizer {
    catalog: Catalog,
    fetcher: HttpFetcher,
    limiter: RateLimiter,
    families: Vec<FamilyConfig>,
    opts: SyncOptions,
}

impl Synchronizer {
    /// Creates a synchronizer over the given catalog, family set, and options.
    #[must_use]
    pub fn new(catalog: Catalog, families: Vec<FamilyConfig>, opts: SyncOptions) -> Self {
        Self {
            catalog,
            fetcher: HttpFetcher::new(),
            limiter: RateLimiter::new(LISTING_PAUSE),
            families,
            opts,
        }
    }

    /// Synchronizes every configured family, then backfills missing images
    /// when materialization is enabled.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyncError`] raised inside a family's processing;
    /// earlier families' committed work stands.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<SyncSummary, SyncError> {
        self.ensure_families().await?;

        let mut summary = SyncSummary::default();
        for config in &self.families {
            let counts = self.run_family(config).await?;
            summary.families.push(FamilySummary {
                family: config.name.clone(),
                counts,
            });
        }

        if self.opts.download_images {
            self.backfill_missing_images(&mut summary).await?;
        }

        let totals = summary.totals();
        info!(
            families = summary.families.len(),
            files_seen = totals.files_seen,
            products_created = totals.products_created,
            images_downloaded = totals.images_downloaded,
            "sync complete"
        );
        Ok(summary)
    }

    /// Synchronizes a single family by name.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownFamily`] before any crawling when the
    /// name is not configured, or the family's processing error.
    #[instrument(skip(self), fields(family = %name))]
    pub async fn sync_family(&self, name: &str) -> Result<SyncSummary, SyncError> {
        let config = self
            .families
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SyncError::UnknownFamily(name.to_string()))?;

        self.ensure_families().await?;

        let counts = self.run_family(config).await?;
        Ok(SyncSummary {
            families: vec![FamilySummary {
                family: config.name.clone(),
                counts,
            }],
            ..SyncSummary::default()
        })
    }

    /// Registers every configured family definition (idempotent).
    async fn ensure_families(&self) -> Result<(), SyncError> {
        for config in &self.families {
            self.catalog
                .ensure_family(&config.name, &config.description, &config.base_url)
                .await?;
        }
        Ok(())
    }

    /// Runs one family's crawl planner.
    async fn run_family(&self, config: &FamilyConfig) -> Result<FamilyCounts, SyncError> {
        let family = self
            .catalog
            .ensure_family(&config.name, &config.description, &config.base_url)
            .await?;

        info!(family = %config.name, "syncing product family");
        let ctx = FamilyCrawl {
            fetcher: &self.fetcher,
            limiter: &self.limiter,
            catalog: &self.catalog,
            family: &family,
            opts: &self.opts,
        };

        let result = match &config.topology {
            Topology::Gridded => crawl_gridded(&ctx).await,
            Topology::Periodic {
                expected_files,
                valid_hm,
            } => crawl_periodic(&ctx, expected_files, *valid_hm).await,
            Topology::Fixed { files, valid_hm } => crawl_fixed(&ctx, files, *valid_hm).await,
        };

        match result {
            Ok(counts) => {
                info!(
                    family = %config.name,
                    files_seen = counts.files_seen,
                    products_created = counts.products_created,
                    products_updated = counts.products_updated,
                    "family sync finished"
                );
                Ok(counts)
            }
            Err(error) => {
                error!(family = %config.name, error = %error, "family sync failed");
                Err(error.into())
            }
        }
    }

    /// Attempts materialization for every product still missing a local
    /// image, catalog-wide.
    async fn backfill_missing_images(&self, summary: &mut SyncSummary) -> Result<(), SyncError> {
        let missing = self.catalog.products_missing_image().await?;
        info!(count = missing.len(), "backfilling missing images");

        for product in &missing {
            let outcome = materialize(
                &self.fetcher,
                &self.catalog,
                &ImageRef::from_product(product),
                &self.opts.media_dir,
            )
            .await?;
            match outcome {
                MaterializeOutcome::Downloaded(_) => summary.backfill_downloaded += 1,
                MaterializeOutcome::NotFound => summary.backfill_missing += 1,
                MaterializeOutcome::TransientFailure => summary.backfill_failed += 1,
                MaterializeOutcome::AlreadyPresent => {}
            }
        }
        Ok(())
    }
}
