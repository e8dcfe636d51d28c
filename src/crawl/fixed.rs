//! Depth-0 "crawl" of statically located products.
//!
//! Fixed families publish a single file at a known path (fire-weather index,
//! road-wind animation). There is nothing to discover: each configured file
//! is reconciled against today's date at the configured valid time, which
//! re-affirms the product on every sync without duplicating rows.

use chrono::NaiveTime;
use tracing::info;

use crate::catalog::{CatalogError, Discovery};
use crate::crawl::FixedFile;
use crate::sync::FamilyCounts;

use super::{FamilyCrawl, reconcile_and_materialize};

/// Records the statically configured files of a fixed family.
///
/// # Errors
///
/// Returns [`CatalogError`] if a reconciliation or catalog write fails.
pub(crate) async fn crawl(
    ctx: &FamilyCrawl<'_>,
    files: &[FixedFile],
    valid_hm: NaiveTime,
) -> Result<FamilyCounts, CatalogError> {
    let mut counts = FamilyCounts::default();

    for file in files {
        let remote_url = format!("{}{}", ctx.family.base_url, file.path);
        info!(filename = %file.filename, "recording static product");

        let discovery = Discovery {
            family_id: ctx.family.id,
            variable: None,
            filename: &file.filename,
            remote_url: &remote_url,
            valid_date: ctx.opts.today,
            valid_hm,
        };
        reconcile_and_materialize(ctx, &discovery, &mut counts).await?;
    }

    Ok(counts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::catalog::{Catalog, ProductFilter};
    use crate::crawl::SyncOptions;
    use crate::db::Database;
    use crate::fetch::{HttpFetcher, RateLimiter};

    fn fwi_files() -> Vec<FixedFile> {
        vec![FixedFile {
            filename: "FWI.png".to_string(),
            path: "FWI.png".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_fixed_crawl_records_product_without_any_listing() {
        let db = Database::new_in_memory().await.unwrap();
        let catalog = Catalog::new(db);
        let family = catalog
            .ensure_family("FWI", "fire index", "https://example.com/FWI/")
            .await
            .unwrap();
        let fetcher = HttpFetcher::new();
        let limiter = RateLimiter::new(Duration::ZERO);
        let opts = SyncOptions {
            download_images: false,
            media_dir: PathBuf::from("unused"),
            ..SyncOptions::for_today(NaiveDate::from_ymd_opt(2025, 6, 24).unwrap())
        };

        let counts = crawl(
            &FamilyCrawl {
                fetcher: &fetcher,
                limiter: &limiter,
                catalog: &catalog,
                family: &family,
                opts: &opts,
            },
            &fwi_files(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(counts.files_seen, 1);
        assert_eq!(counts.products_created, 1);

        let products = catalog.products(&ProductFilter::default()).await.unwrap();
        assert_eq!(products[0].remote_url, "https://example.com/FWI/FWI.png");
    }

    #[tokio::test]
    async fn test_fixed_crawl_reaffirms_on_successive_days() {
        let db = Database::new_in_memory().await.unwrap();
        let catalog = Catalog::new(db);
        let family = catalog
            .ensure_family("FWI", "fire index", "https://example.com/FWI/")
            .await
            .unwrap();
        let fetcher = HttpFetcher::new();
        let limiter = RateLimiter::new(Duration::ZERO);
        let valid_hm = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

        let day_one = SyncOptions {
            download_images: false,
            media_dir: PathBuf::from("unused"),
            ..SyncOptions::for_today(NaiveDate::from_ymd_opt(2025, 6, 24).unwrap())
        };
        let day_two = SyncOptions {
            today: NaiveDate::from_ymd_opt(2025, 6, 25).unwrap(),
            ..day_one.clone()
        };

        let first = crawl(
            &FamilyCrawl {
                fetcher: &fetcher,
                limiter: &limiter,
                catalog: &catalog,
                family: &family,
                opts: &day_one,
            },
            &fwi_files(),
            valid_hm,
        )
        .await
        .unwrap();
        let second = crawl(
            &FamilyCrawl {
                fetcher: &fetcher,
                limiter: &limiter,
                catalog: &catalog,
                family: &family,
                opts: &day_two,
            },
            &fwi_files(),
            valid_hm,
        )
        .await
        .unwrap();

        // One product, re-affirmed valid on a second calendar day.
        assert_eq!(first.products_created, 1);
        assert_eq!(second.products_created, 0);
        assert_eq!(second.valid_times_created, 1);

        let products = catalog.products(&ProductFilter::default()).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(
            catalog
                .product_valid_times(products[0].id)
                .await
                .unwrap()
                .len(),
            2
        );
    }
}
