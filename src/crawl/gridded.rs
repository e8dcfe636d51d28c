//! Depth-3 crawl of the gridded-model directory hierarchy.
//!
//! Layout on the server: `base/{year}_{month}/{DD}_{HH}/{variable}/<frame>.png`.
//! Run directories outside the lookback window are skipped before any
//! further listing, so a deep history never costs extra requests.

use tracing::{debug, info};

use crate::catalog::{CatalogError, Discovery};
use crate::decode::{GriddedFrame, RunDirectory};
use crate::sync::FamilyCounts;

use super::{FamilyCrawl, list_or_empty, reconcile_and_materialize};

/// Crawls one month of model runs for a gridded family.
///
/// # Errors
///
/// Returns [`CatalogError`] if a reconciliation or catalog write fails;
/// listing failures are absorbed as empty directories.
pub(crate) async fn crawl(ctx: &FamilyCrawl<'_>) -> Result<FamilyCounts, CatalogError> {
    let mut counts = FamilyCounts::default();
    let month_url = format!(
        "{}{}_{:02}/",
        ctx.family.base_url, ctx.opts.year, ctx.opts.month
    );
    let cutoff = ctx.opts.cutoff();

    for run_name in list_or_empty(ctx, &month_url).await {
        let Some(run) = RunDirectory::parse(&run_name, ctx.opts.year, ctx.opts.month) else {
            continue;
        };
        if run.run_date < cutoff {
            debug!(run_date = %run.run_date, "run outside lookback window, skipping");
            continue;
        }

        info!(run_date = %run.run_date, run_hour = run.run_hour, "crawling model run");
        let run_url = format!("{month_url}{run_name}/");

        for variable in list_or_empty(ctx, &run_url).await {
            let variable_url = format!("{run_url}{variable}/");

            for file in list_or_empty(ctx, &variable_url).await {
                let Some(frame) = GriddedFrame::parse(&file) else {
                    continue;
                };
                let (valid_date, valid_hm) = frame.valid_time();
                let remote_url = format!("{variable_url}{file}");

                let discovery = Discovery {
                    family_id: ctx.family.id,
                    variable: Some(&variable),
                    filename: &file,
                    remote_url: &remote_url,
                    valid_date,
                    valid_hm,
                };
                reconcile_and_materialize(ctx, &discovery, &mut counts).await?;
            }
        }
    }

    Ok(counts)
}
