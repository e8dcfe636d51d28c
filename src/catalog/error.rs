//! Error types for catalog operations.

use thiserror::Error;

/// Errors that can occur during catalog operations.
///
/// Reconciliation conflicts (uniqueness violations under concurrent access)
/// surface through the `Database` variant rather than being swallowed; the
/// caller decides whether to retry.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Underlying database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A product family was referenced that is not registered.
    #[error("product family not found: {0}")]
    FamilyNotFound(String),

    /// A product row was referenced that does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_family_not_found_display() {
        let error = CatalogError::FamilyNotFound("wrf_cba".to_string());
        let msg = error.to_string();
        assert!(msg.contains("wrf_cba"), "Expected family name in: {msg}");
    }

    #[test]
    fn test_catalog_error_product_not_found_display() {
        let error = CatalogError::ProductNotFound(42);
        assert!(error.to_string().contains("42"));
    }
}
