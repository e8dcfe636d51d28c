//! Image materialization: best-effort local copies of catalogued images.
//!
//! Materialization is a side-effect stage after reconciliation. Transport
//! failures never abort the batch: a 404 is reported as missing, a timeout
//! or connection error leaves the product eligible for a future pass.
//! Only catalog (database) errors propagate.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use url::Url;

use crate::catalog::{Catalog, CatalogError, Product};
use crate::fetch::{FetchError, HttpFetcher};

/// Result of one materialization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// The image was fetched and stored at the given path.
    Downloaded(PathBuf),
    /// The product already has a local image; nothing was fetched.
    AlreadyPresent,
    /// The remote image does not exist (HTTP 404).
    NotFound,
    /// A transient failure (timeout, connection error, IO); the product
    /// stays eligible for materialization on a future pass.
    TransientFailure,
}

/// The image-bearing fields of a product, borrowed.
///
/// Crawl planners build this from a fresh [`ReconcileOutcome`]; the
/// missing-image backfill pass builds it from stored [`Product`] rows.
///
/// [`ReconcileOutcome`]: crate::catalog::ReconcileOutcome
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a> {
    /// Catalog row id of the product.
    pub product_id: i64,
    /// The product's catalog filename (fallback for name derivation).
    pub filename: &'a str,
    /// Remote URL of the image.
    pub remote_url: &'a str,
    /// Already-materialized local path, if any.
    pub local_image: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    /// Borrows the image-bearing fields of a stored product row.
    #[must_use]
    pub fn from_product(product: &'a Product) -> Self {
        Self {
            product_id: product.id,
            filename: &product.filename,
            remote_url: &product.remote_url,
            local_image: product.local_image.as_deref(),
        }
    }
}

/// Fetches a product's image and records the local copy in the catalog.
///
/// Skips entirely when the product already has a local image. All transport
/// failures are swallowed into the outcome; the catalog write is the only
/// operation that can error.
///
/// # Errors
///
/// Returns [`CatalogError`] if recording the local image path fails.
pub async fn materialize(
    fetcher: &HttpFetcher,
    catalog: &Catalog,
    image: &ImageRef<'_>,
    media_dir: &Path,
) -> Result<MaterializeOutcome, CatalogError> {
    if image.local_image.is_some() {
        return Ok(MaterializeOutcome::AlreadyPresent);
    }

    if let Err(error) = tokio::fs::create_dir_all(media_dir).await {
        warn!(dir = %media_dir.display(), error = %error, "cannot create media directory");
        return Ok(MaterializeOutcome::TransientFailure);
    }

    let name = derived_image_name(image.remote_url, image.filename);
    let dest = media_dir.join(&name);

    match fetcher.download_to_file(image.remote_url, &dest).await {
        Ok(bytes) => {
            catalog
                .set_local_image(image.product_id, &dest.to_string_lossy())
                .await?;
            info!(
                product_id = image.product_id,
                path = %dest.display(),
                bytes,
                "image materialized"
            );
            Ok(MaterializeOutcome::Downloaded(dest))
        }
        Err(FetchError::NotFound { .. }) => {
            warn!(url = %image.remote_url, "image not found on server");
            Ok(MaterializeOutcome::NotFound)
        }
        Err(error) => {
            // Timeout, connection error, 5xx: report and move on; the
            // product stays without a local image and will be retried on
            // the next pass.
            warn!(url = %image.remote_url, error = %error, "image download failed");
            Ok(MaterializeOutcome::TransientFailure)
        }
    }
}

/// Derives the on-disk filename for an image: the URL's last path segment,
/// or `<product filename>.png` when the URL yields no usable name.
fn derived_image_name(url: &str, fallback: &str) -> String {
    let from_url = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(ToString::to_string))
    });

    match from_url {
        Some(segment) if segment.contains('.') => urlencoding::decode(&segment)
            .map_or_else(|_| segment.clone(), |decoded| decoded.into_owned()),
        _ => format!("{fallback}.png"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::catalog::{Discovery, ProductFilter};
    use crate::db::Database;

    async fn catalog_with_product(remote_url: &str) -> (Catalog, i64) {
        let db = Database::new_in_memory().await.unwrap();
        let catalog = Catalog::new(db);
        let family = catalog
            .ensure_family("FWI", "fire index", "https://example.com/")
            .await
            .unwrap();
        let outcome = catalog
            .reconcile(&Discovery {
                family_id: family.id,
                variable: None,
                filename: "FWI.png",
                remote_url,
                valid_date: NaiveDate::from_ymd_opt(2025, 6, 24).unwrap(),
                valid_hm: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        (catalog, outcome.product_id)
    }

    #[test]
    fn test_derived_image_name_uses_url_segment() {
        assert_eq!(
            derived_image_name("https://example.com/FWI/FWI.png", "FWI.png"),
            "FWI.png"
        );
    }

    #[test]
    fn test_derived_image_name_decodes_percent_encoding() {
        assert_eq!(
            derived_image_name("https://example.com/img%20one.png", "fallback"),
            "img one.png"
        );
    }

    #[test]
    fn test_derived_image_name_falls_back_without_extension() {
        assert_eq!(
            derived_image_name("https://example.com/download/42", "frame-2025-06-24"),
            "frame-2025-06-24.png"
        );
    }

    #[tokio::test]
    async fn test_materialize_downloads_and_records_path() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/FWI.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png bytes"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/FWI.png", mock_server.uri());
        let (catalog, product_id) = catalog_with_product(&url).await;
        let fetcher = HttpFetcher::new();

        let outcome = materialize(
            &fetcher,
            &catalog,
            &ImageRef {
                product_id,
                filename: "FWI.png",
                remote_url: &url,
                local_image: None,
            },
            temp_dir.path(),
        )
        .await
        .unwrap();

        let dest = temp_dir.path().join("FWI.png");
        assert_eq!(outcome, MaterializeOutcome::Downloaded(dest.clone()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"png bytes");

        let products = catalog.products(&ProductFilter::default()).await.unwrap();
        assert_eq!(
            products[0].local_image.as_deref(),
            Some(dest.to_string_lossy().as_ref())
        );
    }

    #[tokio::test]
    async fn test_materialize_skips_when_already_present() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        // No request may reach the server for an already-materialized product.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let url = format!("{}/FWI.png", mock_server.uri());
        let (catalog, product_id) = catalog_with_product(&url).await;
        let fetcher = HttpFetcher::new();

        let outcome = materialize(
            &fetcher,
            &catalog,
            &ImageRef {
                product_id,
                filename: "FWI.png",
                remote_url: &url,
                local_image: Some("media/FWI.png"),
            },
            temp_dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, MaterializeOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_materialize_404_reports_not_found_and_stays_eligible() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/FWI.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/FWI.png", mock_server.uri());
        let (catalog, product_id) = catalog_with_product(&url).await;
        let fetcher = HttpFetcher::new();

        let image = ImageRef {
            product_id,
            filename: "FWI.png",
            remote_url: &url,
            local_image: None,
        };

        let outcome = materialize(&fetcher, &catalog, &image, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(outcome, MaterializeOutcome::NotFound);

        // The local-image field stays empty and a later pass tries again.
        let products = catalog.products(&ProductFilter::default()).await.unwrap();
        assert!(products[0].local_image.is_none());

        let retry = materialize(&fetcher, &catalog, &image, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(retry, MaterializeOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_materialize_connection_error_is_transient() {
        let temp_dir = TempDir::new().unwrap();
        let url = "http://127.0.0.1:1/FWI.png";
        let (catalog, product_id) = catalog_with_product(url).await;
        let fetcher = HttpFetcher::new();

        let outcome = materialize(
            &fetcher,
            &catalog,
            &ImageRef {
                product_id,
                filename: "FWI.png",
                remote_url: url,
                local_image: None,
            },
            temp_dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, MaterializeOutcome::TransientFailure);
        let products = catalog.products(&ProductFilter::default()).await.unwrap();
        assert!(products[0].local_image.is_none());
    }

    #[tokio::test]
    async fn test_image_ref_from_product_borrows_fields() {
        let (catalog, _) = catalog_with_product("https://example.com/FWI.png").await;
        let products = catalog.products(&ProductFilter::default()).await.unwrap();

        let image = ImageRef::from_product(&products[0]);
        assert_eq!(image.filename, "FWI.png");
        assert_eq!(image.remote_url, "https://example.com/FWI.png");
        assert!(image.local_image.is_none());
    }
}
