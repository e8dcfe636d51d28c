//! Per-family crawl configuration.
//!
//! Every product family carries one explicit [`FamilyConfig`] naming its
//! base URL and discovery topology; the crawl planners are driven entirely
//! by these values, never by per-call constants. The default set mirrors
//! the four OHMC families, and the whole set can be rebased onto a mirror
//! (or a test server) with [`FamilyConfig::default_set_with_root`].

use std::path::PathBuf;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};

/// Root of the production OHMC public file server.
pub const DEFAULT_SERVER_ROOT: &str = "https://yaku.ohmc.ar/public";

/// Default lookback window for discovery crawls, in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Discovery topology of a product family.
#[derive(Debug, Clone)]
pub enum Topology {
    /// Hierarchical run/variable directories:
    /// `base/{year}_{month}/{DD}_{HH}/{variable}/<frame>.png`.
    Gridded,

    /// Flat day directories holding a fixed, known set of chart files:
    /// `base/{month}/{day}/<chart>.png`.
    Periodic {
        /// The chart filenames expected inside each day directory.
        expected_files: Vec<String>,
        /// Wall-clock time the daily charts are asserted valid at.
        valid_hm: NaiveTime,
    },

    /// Fixed single-file paths; no crawling.
    Fixed {
        /// The files and their paths relative to the family base URL.
        files: Vec<FixedFile>,
        /// Wall-clock time the files are asserted valid at.
        valid_hm: NaiveTime,
    },
}

/// One statically known file of a [`Topology::Fixed`] family.
#[derive(Debug, Clone)]
pub struct FixedFile {
    /// Catalog filename of the product.
    pub filename: String,
    /// Path relative to the family base URL.
    pub path: String,
}

/// Explicit configuration of one product family.
#[derive(Debug, Clone)]
pub struct FamilyConfig {
    /// Unique family name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Base URL, ending in `/`.
    pub base_url: String,
    /// Discovery topology.
    pub topology: Topology,
}

impl FamilyConfig {
    /// The four OHMC product families against the production server.
    #[must_use]
    pub fn default_set() -> Vec<Self> {
        Self::default_set_with_root(DEFAULT_SERVER_ROOT)
    }

    /// The four OHMC product families rebased onto an alternate server root.
    #[must_use]
    pub fn default_set_with_root(root: &str) -> Vec<Self> {
        let root = root.trim_end_matches('/');
        vec![
            Self {
                name: "wrf_cba".to_string(),
                description: "Hourly products generated by the WRF model for Córdoba".to_string(),
                base_url: format!("{root}/wrf/img/CBA/"),
                topology: Topology::Gridded,
            },
            Self {
                name: "MedicionAire".to_string(),
                description: "Daily greenhouse-gas visualizations".to_string(),
                base_url: format!("{root}/MedicionAire/"),
                topology: Topology::Periodic {
                    expected_files: vec![
                        "CH4_webvisualizer_v4.png".to_string(),
                        "CO2_webvisualizer_v4.png".to_string(),
                    ],
                    valid_hm: hm(10, 30),
                },
            },
            Self {
                name: "FWI".to_string(),
                description: "Fire weather danger index".to_string(),
                base_url: format!("{root}/FWI/"),
                topology: Topology::Fixed {
                    files: vec![FixedFile {
                        filename: "FWI.png".to_string(),
                        path: "FWI.png".to_string(),
                    }],
                    valid_hm: hm(11, 0),
                },
            },
            Self {
                name: "rutas_caminera".to_string(),
                description: "Wind-gust animation over provincial routes".to_string(),
                base_url: format!("{root}/rutas_caminera/"),
                topology: Topology::Fixed {
                    files: vec![FixedFile {
                        filename: "rafagas_rutas.gif".to_string(),
                        path: "rafagas_rutas.gif".to_string(),
                    }],
                    valid_hm: hm(11, 0),
                },
            },
        ]
    }
}

/// Options for one sync invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Skip runs/days older than `today - lookback_days`.
    pub lookback_days: u32,
    /// Year of the month to crawl (historical backfill support).
    pub year: i32,
    /// Month to crawl, 1–12.
    pub month: u32,
    /// "Today" for window arithmetic and fixed-product valid dates.
    pub today: NaiveDate,
    /// Explicit window start; overrides the lookback computation when set.
    pub start_date: Option<NaiveDate>,
    /// Whether to materialize local image copies.
    pub download_images: bool,
    /// Directory materialized images are stored under.
    pub media_dir: PathBuf,
}

impl SyncOptions {
    /// Default options for the given "today": current year and month, the
    /// default lookback window, image materialization enabled.
    #[must_use]
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            year: today.year(),
            month: today.month(),
            today,
            start_date: None,
            download_images: true,
            media_dir: PathBuf::from("media"),
        }
    }

    /// The oldest run/observation date this sync will accept.
    #[must_use]
    pub fn cutoff(&self) -> NaiveDate {
        self.start_date.unwrap_or_else(|| {
            self.today
                .checked_sub_days(Days::new(u64::from(self.lookback_days)))
                .unwrap_or(NaiveDate::MIN)
        })
    }
}

/// Builds a time-of-day from hour and minute known to be in range.
#[allow(clippy::expect_used)]
fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("static time is valid")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_set_covers_all_four_families() {
        let families = FamilyConfig::default_set();
        let names: Vec<_> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["wrf_cba", "MedicionAire", "FWI", "rutas_caminera"]);
    }

    #[test]
    fn test_default_set_uses_production_urls() {
        let families = FamilyConfig::default_set();
        assert_eq!(
            families[0].base_url,
            "https://yaku.ohmc.ar/public/wrf/img/CBA/"
        );
        assert_eq!(
            families[1].base_url,
            "https://yaku.ohmc.ar/public/MedicionAire/"
        );
    }

    #[test]
    fn test_default_set_with_root_rebases_every_family() {
        let families = FamilyConfig::default_set_with_root("http://127.0.0.1:8080/public/");
        for family in &families {
            assert!(
                family.base_url.starts_with("http://127.0.0.1:8080/public/"),
                "family {} not rebased: {}",
                family.name,
                family.base_url
            );
        }
    }

    #[test]
    fn test_sync_options_cutoff_uses_lookback() {
        let mut opts = SyncOptions::for_today(date(2025, 6, 24));
        opts.lookback_days = 7;
        assert_eq!(opts.cutoff(), date(2025, 6, 17));
    }

    #[test]
    fn test_sync_options_start_date_overrides_lookback() {
        let mut opts = SyncOptions::for_today(date(2025, 6, 24));
        opts.lookback_days = 7;
        opts.start_date = Some(date(2025, 6, 1));
        assert_eq!(opts.cutoff(), date(2025, 6, 1));
    }

    #[test]
    fn test_sync_options_for_today_defaults() {
        let opts = SyncOptions::for_today(date(2025, 6, 24));
        assert_eq!(opts.year, 2025);
        assert_eq!(opts.month, 6);
        assert_eq!(opts.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert!(opts.download_images);
    }
}
