//! Catalog persistence: product families, products, and valid-time records.
//!
//! This module provides the SQLite-backed catalog that discovery writes into
//! and the presentation layer reads from. The write side is the
//! [`Catalog::reconcile`] upsert; the read side covers the family/product
//! queries, "latest per product" lookup, and per-date aggregates.
//!
//! # Overview
//!
//! - [`Catalog`] - Main interface for catalog operations
//! - [`ProductFamily`], [`Product`], [`ValidTime`] - Row types
//! - [`Discovery`] - One discovered item handed to the reconciler
//! - [`ReconcileOutcome`] - Created/updated result of a reconciliation
//! - [`CatalogError`] - Operation error types
//!
//! # Example
//!
//! ```ignore
//! use ohmc_sync_core::{Catalog, Database, Discovery};
//!
//! let db = Database::new(Path::new("catalog.db")).await?;
//! let catalog = Catalog::new(db);
//!
//! let family = catalog.ensure_family("wrf_cba", "WRF products", "https://...").await?;
//! let outcome = catalog.reconcile(&discovery).await?;
//! ```

mod error;
mod record;

pub use error::CatalogError;
pub use record::{
    CatalogStats, DateSummary, Discovery, FamilyProductCount, HourSummary, LatestProduct, Product,
    ProductFamily, ProductFilter, ReconcileOutcome, ValidTime, VariableSummary,
};

use sqlx::Row;
use tracing::instrument;

use crate::db::Database;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog manager for discovered meteorological products.
///
/// All mutating operations are written as atomic insert-if-absent statements
/// against the schema's uniqueness constraints, so concurrent reconciliation
/// of the same natural key cannot produce duplicate rows.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    /// Creates a new catalog manager with the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Registers a product family if it does not exist yet and returns it.
    ///
    /// Repeated calls with the same name are no-ops; the existing row is
    /// returned unchanged (description and base URL are not rewritten).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the insert or lookup fails.
    #[instrument(skip(self, description, base_url), fields(name = %name))]
    pub async fn ensure_family(
        &self,
        name: &str,
        description: &str,
        base_url: &str,
    ) -> Result<ProductFamily> {
        sqlx::query(
            r"INSERT INTO product_family (name, description, base_url)
              VALUES (?, ?, ?)
              ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(base_url)
        .execute(self.db.pool())
        .await?;

        let family = sqlx::query_as::<_, ProductFamily>(
            "SELECT * FROM product_family WHERE name = ?",
        )
        .bind(name)
        .fetch_one(self.db.pool())
        .await?;

        Ok(family)
    }

    /// Looks up a product family by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn family_by_name(&self, name: &str) -> Result<Option<ProductFamily>> {
        let family = sqlx::query_as::<_, ProductFamily>(
            "SELECT * FROM product_family WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(family)
    }

    /// Returns all registered product families, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn families(&self) -> Result<Vec<ProductFamily>> {
        let families =
            sqlx::query_as::<_, ProductFamily>("SELECT * FROM product_family ORDER BY name")
                .fetch_all(self.db.pool())
                .await?;

        Ok(families)
    }

    /// Reconciles one discovered item against the catalog.
    ///
    /// Steps:
    /// 1. Atomically insert the product under its natural key
    ///    (family, variable, filename); on conflict, refresh the stored
    ///    remote URL in place instead.
    /// 2. Insert the valid-time record; a duplicate (product, date, time)
    ///    key is a no-op, so repeated crawls over the same data never grow
    ///    the valid-time set.
    ///
    /// The insert is the atomic arbiter of creation, so two concurrent
    /// reconciliations of the same key cannot both create a row.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if any statement fails.
    #[instrument(
        skip(self, discovery),
        fields(filename = %discovery.filename, valid_date = %discovery.valid_date)
    )]
    pub async fn reconcile(&self, discovery: &Discovery<'_>) -> Result<ReconcileOutcome> {
        let variable = discovery.variable.unwrap_or("");

        let inserted = sqlx::query(
            r"INSERT INTO product (family_id, variable, filename, remote_url)
              VALUES (?, ?, ?, ?)
              ON CONFLICT(family_id, variable, filename) DO NOTHING
              RETURNING id",
        )
        .bind(discovery.family_id)
        .bind(variable)
        .bind(discovery.filename)
        .bind(discovery.remote_url)
        .fetch_optional(self.db.pool())
        .await?;

        let (product_id, product_created, local_image) = match inserted {
            Some(row) => (row.get("id"), true, None),
            None => {
                // Existing product: the remote URL always reflects the most
                // recent discovery pass.
                let row = sqlx::query(
                    r"UPDATE product
                      SET remote_url = ?, updated_at = datetime('now')
                      WHERE family_id = ? AND variable = ? AND filename = ?
                      RETURNING id, local_image",
                )
                .bind(discovery.remote_url)
                .bind(discovery.family_id)
                .bind(variable)
                .bind(discovery.filename)
                .fetch_one(self.db.pool())
                .await?;
                (row.get("id"), false, row.get("local_image"))
            }
        };

        let valid_time = sqlx::query(
            r"INSERT INTO valid_time (product_id, valid_date, valid_hm)
              VALUES (?, ?, ?)
              ON CONFLICT(product_id, valid_date, valid_hm) DO NOTHING",
        )
        .bind(product_id)
        .bind(discovery.valid_date.format("%Y-%m-%d").to_string())
        .bind(discovery.valid_hm.format("%H:%M").to_string())
        .execute(self.db.pool())
        .await?;

        Ok(ReconcileOutcome {
            product_id,
            product_created,
            valid_time_created: valid_time.rows_affected() > 0,
            local_image,
        })
    }

    /// Records the locally materialized image path for a product.
    ///
    /// A local image, once materialized, is never replaced: the update only
    /// applies while `local_image` is NULL, so a second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if no product exists with
    /// the given id, or [`CatalogError::Database`] if the update fails.
    #[instrument(skip(self), fields(product_id, path = %path))]
    pub async fn set_local_image(&self, product_id: i64, path: &str) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE product
              SET local_image = ?, updated_at = datetime('now')
              WHERE id = ? AND local_image IS NULL",
        )
        .bind(path)
        .bind(product_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM product WHERE id = ?")
                .bind(product_id)
                .fetch_optional(self.db.pool())
                .await?;
            if exists.is_none() {
                return Err(CatalogError::ProductNotFound(product_id));
            }
        }

        Ok(())
    }

    /// Returns products without a locally materialized image, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn products_missing_image(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM product WHERE local_image IS NULL ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(products)
    }

    /// Queries products matching a filter.
    ///
    /// Unset filter fields match everything. Date/time restrictions match
    /// products that have at least one valid-time record on the given key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let valid_date = filter.valid_date.map(|d| d.format("%Y-%m-%d").to_string());
        let valid_hm = filter.valid_hm.map(|t| t.format("%H:%M").to_string());

        let products = sqlx::query_as::<_, Product>(
            r"SELECT p.*
              FROM product p
              JOIN product_family f ON f.id = p.family_id
              WHERE (?1 IS NULL OR f.name = ?1)
                AND (?2 IS NULL OR p.variable = ?2)
                AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM valid_time v
                    WHERE v.product_id = p.id
                      AND v.valid_date = ?3
                      AND (?4 IS NULL OR v.valid_hm = ?4)))
              ORDER BY p.id",
        )
        .bind(filter.family.as_deref())
        .bind(filter.variable.as_deref())
        .bind(valid_date)
        .bind(valid_hm)
        .fetch_all(self.db.pool())
        .await?;

        Ok(products)
    }

    /// Returns the valid-time records of one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn product_valid_times(&self, product_id: i64) -> Result<Vec<ValidTime>> {
        let times = sqlx::query_as::<_, ValidTime>(
            r"SELECT * FROM valid_time
              WHERE product_id = ?
              ORDER BY valid_date DESC, valid_hm DESC",
        )
        .bind(product_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(times)
    }

    /// Returns each product joined with its most recent valid-time record,
    /// newest first, optionally restricted to one family.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn latest_products(&self, family: Option<&str>) -> Result<Vec<LatestProduct>> {
        let latest = sqlx::query_as::<_, LatestProduct>(
            r"SELECT p.id, f.name AS family, p.variable, p.filename,
                     p.remote_url, p.local_image, v.valid_date, v.valid_hm
              FROM product p
              JOIN product_family f ON f.id = p.family_id
              JOIN valid_time v ON v.product_id = p.id
              WHERE v.id = (
                  SELECT v2.id FROM valid_time v2
                  WHERE v2.product_id = p.id
                  ORDER BY v2.valid_date DESC, v2.valid_hm DESC
                  LIMIT 1)
                AND (?1 IS NULL OR f.name = ?1)
              ORDER BY v.valid_date DESC, v.valid_hm DESC, p.id",
        )
        .bind(family)
        .fetch_all(self.db.pool())
        .await?;

        Ok(latest)
    }

    /// Per-date aggregates for one family: record count, distinct variables,
    /// distinct times of day. Newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn date_summary(&self, family: &str) -> Result<Vec<DateSummary>> {
        let rows = sqlx::query_as::<_, DateSummary>(
            r"SELECT v.valid_date,
                     COUNT(*) AS records,
                     COUNT(DISTINCT NULLIF(p.variable, '')) AS variables,
                     COUNT(DISTINCT v.valid_hm) AS times
              FROM valid_time v
              JOIN product p ON p.id = v.product_id
              JOIN product_family f ON f.id = p.family_id
              WHERE f.name = ?
              GROUP BY v.valid_date
              ORDER BY v.valid_date DESC",
        )
        .bind(family)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Per-hour aggregates for one family on one date, ordered by time.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn hour_summary(
        &self,
        family: &str,
        date: chrono::NaiveDate,
    ) -> Result<Vec<HourSummary>> {
        let rows = sqlx::query_as::<_, HourSummary>(
            r"SELECT v.valid_hm,
                     COUNT(*) AS records,
                     COUNT(DISTINCT NULLIF(p.variable, '')) AS variables
              FROM valid_time v
              JOIN product p ON p.id = v.product_id
              JOIN product_family f ON f.id = p.family_id
              WHERE f.name = ? AND v.valid_date = ?
              GROUP BY v.valid_hm
              ORDER BY v.valid_hm",
        )
        .bind(family)
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Per-variable aggregates for one family, optionally restricted to one
    /// valid date. Variable-less products are excluded.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn variable_summary(
        &self,
        family: &str,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<VariableSummary>> {
        let date = date.map(|d| d.format("%Y-%m-%d").to_string());

        let rows = sqlx::query_as::<_, VariableSummary>(
            r"SELECT p.variable,
                     COUNT(DISTINCT p.id) AS products,
                     COUNT(DISTINCT v.valid_date) AS dates,
                     COUNT(DISTINCT v.valid_hm) AS times
              FROM product p
              JOIN product_family f ON f.id = p.family_id
              LEFT JOIN valid_time v ON v.product_id = p.id
              WHERE f.name = ?1
                AND p.variable != ''
                AND (?2 IS NULL OR v.valid_date = ?2)
              GROUP BY p.variable
              ORDER BY p.variable",
        )
        .bind(family)
        .bind(date)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Whole-catalog aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if any query fails.
    pub async fn stats(&self) -> Result<CatalogStats> {
        let (total_families,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product_family")
            .fetch_one(self.db.pool())
            .await?;
        let (total_products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product")
            .fetch_one(self.db.pool())
            .await?;
        let (total_valid_times,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM valid_time")
            .fetch_one(self.db.pool())
            .await?;
        let families = sqlx::query_as::<_, FamilyProductCount>(
            r"SELECT f.name, COUNT(p.id) AS products
              FROM product_family f
              LEFT JOIN product p ON p.family_id = f.id
              GROUP BY f.id
              ORDER BY f.name",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(CatalogStats {
            total_families,
            total_products,
            total_valid_times,
            families,
        })
    }
}
