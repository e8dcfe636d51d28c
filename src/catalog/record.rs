//! Catalog row types and reconciliation inputs.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::FromRow;

/// A named category of product sharing a discovery topology.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductFamily {
    /// Unique identifier.
    pub id: i64,
    /// Unique family name (e.g. `wrf_cba`).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Base URL the family's products are discovered under.
    pub base_url: String,
    /// When the family was first registered.
    pub created_at: String,
}

/// One concrete catalogued artifact.
///
/// Identified by the natural key (family, variable, filename). The variable
/// column stores the empty string for variable-less products; use
/// [`Product::variable`] to get the `Option` view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    /// Unique identifier.
    pub id: i64,
    /// Owning product family.
    pub family_id: i64,
    /// Model variable, or empty string for variable-less products.
    #[sqlx(rename = "variable")]
    #[serde(rename = "variable")]
    pub variable_raw: String,
    /// Archive filename (natural-key component).
    pub filename: String,
    /// Remote URL as of the most recent discovery pass.
    pub remote_url: String,
    /// Path of the locally materialized image, if any.
    pub local_image: Option<String>,
    /// When the product was first discovered.
    pub created_at: String,
    /// When the product was last re-discovered.
    pub updated_at: String,
}

impl Product {
    /// Returns the model variable, mapping the stored empty string to `None`.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        (!self.variable_raw.is_empty()).then_some(self.variable_raw.as_str())
    }
}

/// One occurrence of a product being valid at a specific date and time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ValidTime {
    /// Unique identifier.
    pub id: i64,
    /// Owning product.
    pub product_id: i64,
    /// Valid calendar date as `YYYY-MM-DD`.
    pub valid_date: String,
    /// Valid time of day as `HH:MM`.
    pub valid_hm: String,
    /// Immutable creation timestamp.
    pub created_at: String,
}

/// A discovered item handed to the reconciler.
///
/// Borrowed view so crawl planners can reconcile without allocating
/// per-item owned strings.
#[derive(Debug, Clone, Copy)]
pub struct Discovery<'a> {
    /// The owning family's row id.
    pub family_id: i64,
    /// Model variable, when the family has one.
    pub variable: Option<&'a str>,
    /// Archive filename (natural-key component).
    pub filename: &'a str,
    /// Full remote URL of the artifact.
    pub remote_url: &'a str,
    /// Forecast/observation valid date.
    pub valid_date: NaiveDate,
    /// Forecast/observation valid time of day.
    pub valid_hm: NaiveTime,
}

/// Result of reconciling one discovery against the catalog.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Row id of the created-or-updated product.
    pub product_id: i64,
    /// True when the product row was created by this reconciliation.
    pub product_created: bool,
    /// True when a new valid-time record was inserted (false on duplicate).
    pub valid_time_created: bool,
    /// Locally materialized image path, if one already exists.
    pub local_image: Option<String>,
}

/// Filter for product queries; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to one product family by name.
    pub family: Option<String>,
    /// Restrict to one model variable.
    pub variable: Option<String>,
    /// Restrict to products valid on an exact date.
    pub valid_date: Option<NaiveDate>,
    /// Restrict to products valid at an exact time of day
    /// (only meaningful together with `valid_date`).
    pub valid_hm: Option<NaiveTime>,
}

/// A product joined with its most recent valid-time record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LatestProduct {
    /// Row id of the product.
    pub id: i64,
    /// Owning family name.
    pub family: String,
    /// Model variable, or empty string.
    #[sqlx(rename = "variable")]
    #[serde(rename = "variable")]
    pub variable_raw: String,
    /// Archive filename.
    pub filename: String,
    /// Remote URL.
    pub remote_url: String,
    /// Locally materialized image path, if any.
    pub local_image: Option<String>,
    /// Most recent valid date.
    pub valid_date: String,
    /// Most recent valid time of day.
    pub valid_hm: String,
}

/// Per-date aggregate over a family's valid-time records.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DateSummary {
    /// The valid date.
    pub valid_date: String,
    /// Total valid-time records on that date.
    pub records: i64,
    /// Distinct model variables on that date.
    pub variables: i64,
    /// Distinct times of day on that date.
    pub times: i64,
}

/// Per-hour aggregate over one date's valid-time records.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HourSummary {
    /// The valid time of day.
    pub valid_hm: String,
    /// Total valid-time records at that time.
    pub records: i64,
    /// Distinct model variables at that time.
    pub variables: i64,
}

/// Per-variable aggregate over a family's products.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariableSummary {
    /// The model variable.
    pub variable: String,
    /// Products carrying that variable.
    pub products: i64,
    /// Distinct valid dates across those products.
    pub dates: i64,
    /// Distinct valid times across those products.
    pub times: i64,
}

/// Product count for one family, used in aggregate stats.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FamilyProductCount {
    /// The family name.
    pub name: String,
    /// Number of products in the family.
    pub products: i64,
}

/// Whole-catalog aggregate statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    /// Total registered product families.
    pub total_families: i64,
    /// Total catalogued products.
    pub total_products: i64,
    /// Total valid-time records.
    pub total_valid_times: i64,
    /// Per-family product counts.
    pub families: Vec<FamilyProductCount>,
}
