//! Stats command handler: query the catalog and print availability summaries.

use anyhow::Result;
use serde_json::json;

use ohmc_sync_core::{Catalog, Database};

use crate::cli::StatsArgs;

/// How many recent dates and latest products the text report shows.
const REPORT_LIMIT: usize = 10;

pub async fn run_stats_command(args: &StatsArgs) -> Result<()> {
    let db = Database::new(&args.db).await?;
    let catalog = Catalog::new(db);

    let stats = catalog.stats().await?;
    let latest = catalog.latest_products(args.family.as_deref()).await?;

    let family_names: Vec<String> = match &args.family {
        Some(name) => vec![name.clone()],
        None => stats.families.iter().map(|f| f.name.clone()).collect(),
    };

    let mut date_summaries = Vec::new();
    for name in &family_names {
        let dates = catalog.date_summary(name).await?;
        date_summaries.push((name.clone(), dates));
    }

    if args.json {
        let dates: serde_json::Map<String, serde_json::Value> = date_summaries
            .iter()
            .map(|(name, dates)| (name.clone(), json!(dates)))
            .collect();
        let report = json!({
            "stats": stats,
            "latest": latest,
            "dates": dates,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} families, {} products, {} valid-time records",
        stats.total_families, stats.total_products, stats.total_valid_times
    );
    for family in &stats.families {
        println!("  {}: {} products", family.name, family.products);
    }

    for (name, dates) in &date_summaries {
        if dates.is_empty() {
            continue;
        }
        println!("\n{name} - dates with data:");
        for summary in dates.iter().take(REPORT_LIMIT) {
            println!(
                "  {}: {} records, {} variables, {} times",
                summary.valid_date, summary.records, summary.variables, summary.times
            );
        }
    }

    if !latest.is_empty() {
        println!("\nlatest products:");
        for product in latest.iter().take(REPORT_LIMIT) {
            let variable = if product.variable_raw.is_empty() {
                String::new()
            } else {
                format!(" [{}]", product.variable_raw)
            };
            println!(
                "  {} {}{} valid {} {}",
                product.family, product.filename, variable, product.valid_date, product.valid_hm
            );
        }
    }

    Ok(())
}
