//! Crawl planners: per-family discovery over the remote file server.
//!
//! One planner per discovery topology: hierarchical run/variable
//! directories for the gridded-model family, flat day directories for the
//! periodic-measurement family, fixed paths for static products. Planners
//! stream every decoded item straight into the reconciler so a partial crawl
//! still commits completed work, and turn listing failures into "zero
//! entries" after logging a warning.

mod config;
mod fixed;
mod gridded;
mod periodic;

pub use config::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_SERVER_ROOT, FamilyConfig, FixedFile, SyncOptions, Topology,
};
pub(crate) use fixed::crawl as crawl_fixed;
pub(crate) use gridded::crawl as crawl_gridded;
pub(crate) use periodic::crawl as crawl_periodic;

use tracing::warn;

use crate::catalog::{Catalog, CatalogError, Discovery, ProductFamily};
use crate::fetch::{HttpFetcher, RateLimiter, listing};
use crate::materialize::{ImageRef, materialize};
use crate::sync::FamilyCounts;

/// Borrowed context shared by the crawl planners of one family.
pub(crate) struct FamilyCrawl<'a> {
    pub fetcher: &'a HttpFetcher,
    pub limiter: &'a RateLimiter,
    pub catalog: &'a Catalog,
    pub family: &'a ProductFamily,
    pub opts: &'a SyncOptions,
}

/// Lists a directory URL, honoring the rate-limit pause, and converts any
/// fetch failure into an empty listing after logging a warning.
pub(crate) async fn list_or_empty(ctx: &FamilyCrawl<'_>, url: &str) -> Vec<String> {
    ctx.limiter.acquire(url).await;
    match listing::list(ctx.fetcher, url).await {
        Ok(entries) => entries,
        Err(error) => {
            warn!(url = %url, error = %error, "listing failed, treating as empty");
            Vec::new()
        }
    }
}

/// Reconciles one discovery and, when enabled, materializes its image.
pub(crate) async fn reconcile_and_materialize(
    ctx: &FamilyCrawl<'_>,
    discovery: &Discovery<'_>,
    counts: &mut FamilyCounts,
) -> Result<(), CatalogError> {
    let outcome = ctx.catalog.reconcile(discovery).await?;

    if ctx.opts.download_images {
        let image = ImageRef {
            product_id: outcome.product_id,
            filename: discovery.filename,
            remote_url: discovery.remote_url,
            local_image: outcome.local_image.as_deref(),
        };
        let materialized = materialize(ctx.fetcher, ctx.catalog, &image, &ctx.opts.media_dir).await?;
        counts.record_image(&materialized);
    }

    counts.record_reconcile(&outcome);
    Ok(())
}
