//! Depth-1 crawl of the periodic-measurement day directories.
//!
//! Layout on the server: `base/{month}/{day}/<chart>.png`, with a fixed,
//! known set of chart filenames per day. Each day directory is listed once
//! and the expected names are membership-tested against the listing; the
//! catalog filename is prefixed with the ISO date so the same chart name on
//! different days yields distinct products.

use chrono::NaiveTime;
use tracing::info;

use crate::catalog::{CatalogError, Discovery};
use crate::decode::day_of_month;
use crate::sync::FamilyCounts;

use super::{FamilyCrawl, list_or_empty, reconcile_and_materialize};

/// Crawls one month of day directories for a periodic family.
///
/// # Errors
///
/// Returns [`CatalogError`] if a reconciliation or catalog write fails;
/// listing failures are absorbed as empty directories.
pub(crate) async fn crawl(
    ctx: &FamilyCrawl<'_>,
    expected_files: &[String],
    valid_hm: NaiveTime,
) -> Result<FamilyCounts, CatalogError> {
    let mut counts = FamilyCounts::default();
    let month_url = format!("{}{:02}/", ctx.family.base_url, ctx.opts.month);
    let cutoff = ctx.opts.cutoff();

    for day_name in list_or_empty(ctx, &month_url).await {
        let Some(date) = day_of_month(&day_name, ctx.opts.year, ctx.opts.month) else {
            continue;
        };
        if date < cutoff {
            continue;
        }

        info!(date = %date, "checking measurement day");
        let day_url = format!("{month_url}{day_name}/");
        let available = list_or_empty(ctx, &day_url).await;

        for expected in expected_files {
            if !available.iter().any(|entry| entry == expected) {
                continue;
            }
            let remote_url = format!("{day_url}{expected}");
            let filename = format!("{}_{expected}", date.format("%Y-%m-%d"));

            let discovery = Discovery {
                family_id: ctx.family.id,
                variable: None,
                filename: &filename,
                remote_url: &remote_url,
                valid_date: date,
                valid_hm,
            };
            reconcile_and_materialize(ctx, &discovery, &mut counts).await?;
        }
    }

    Ok(counts)
}
