//! Sync command handler: run discovery and print the run summary.

use anyhow::Result;
use chrono::{Datelike, Local};

use ohmc_sync_core::{Catalog, Database, FamilyConfig, SyncOptions, Synchronizer};

use crate::cli::SyncArgs;

pub async fn run_sync_command(args: &SyncArgs) -> Result<()> {
    let today = Local::now().date_naive();
    let opts = SyncOptions {
        lookback_days: args.days,
        year: args.year.unwrap_or_else(|| today.year()),
        month: args.month.unwrap_or_else(|| today.month()),
        today,
        start_date: args.start_date,
        download_images: !args.no_images,
        media_dir: args.media_dir.clone(),
    };

    let db = Database::new(&args.db).await?;
    let catalog = Catalog::new(db);
    let families = FamilyConfig::default_set_with_root(&args.server_root);
    let synchronizer = Synchronizer::new(catalog, families, opts);

    let summary = match args.family.as_deref() {
        Some(name) => synchronizer.sync_family(name).await?,
        None => synchronizer.sync_all().await?,
    };

    for family in &summary.families {
        let c = &family.counts;
        println!(
            "{}: {} files seen, {} new products, {} updated, {} new valid times, \
             {} images downloaded ({} missing, {} failed)",
            family.family,
            c.files_seen,
            c.products_created,
            c.products_updated,
            c.valid_times_created,
            c.images_downloaded,
            c.images_missing,
            c.images_failed,
        );
    }

    if !args.no_images {
        println!(
            "backfill: {} images downloaded, {} missing, {} failed",
            summary.backfill_downloaded, summary.backfill_missing, summary.backfill_failed,
        );
    }

    let totals = summary.totals();
    println!(
        "total: {} files seen, {} new products, {} new valid times, {} images downloaded",
        totals.files_seen,
        totals.products_created,
        totals.valid_times_created,
        totals.images_downloaded + summary.backfill_downloaded,
    );

    Ok(())
}
