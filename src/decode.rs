//! Pure filename decoding and forecast valid-time resolution.
//!
//! The remote server encodes product metadata in names instead of publishing
//! an index: gridded-model frames carry variable, run date, run hour, and
//! forecast offset in the filename; run directories carry day-of-month and
//! run hour; periodic-measurement day directories are bare numerals. All
//! decoders are total: unmatched input yields `None`, never an error, since
//! real listings contain plenty of unrelated entries.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;

/// Gridded-model frame name: `<variable>-<YYYY-MM-DD>_<HH>+<HH>.png`.
#[allow(clippy::expect_used)]
static FRAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)-(\d{4}-\d{2}-\d{2})_(\d{2})\+(\d{2})\.png$")
        .expect("frame regex is valid") // Static pattern, safe to panic
});

/// Run-directory name: `<DD>_<HH>` (day-of-month, run hour).
#[allow(clippy::expect_used)]
static RUN_DIR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})_(\d{2})$").expect("run directory regex is valid")
});

/// A decoded gridded-model frame filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GriddedFrame {
    /// Model variable encoded in the name (e.g. `t2`, `ppnaccum`).
    pub variable: String,
    /// Calendar date of the model run.
    pub run_date: NaiveDate,
    /// Hour-of-day the run started, 0–23.
    pub run_hour: u32,
    /// Forecast offset in hours ahead of the run start.
    pub offset_hours: u32,
}

impl GriddedFrame {
    /// Decodes a gridded-model frame filename.
    ///
    /// Returns `None` when the name does not fit the expected pattern or
    /// encodes an impossible date or run hour. A valid decode of offset zero
    /// is `Some`, so "no match" stays distinguishable.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let captures = FRAME_PATTERN.captures(name)?;

        let run_date = NaiveDate::parse_from_str(&captures[2], "%Y-%m-%d").ok()?;
        let run_hour: u32 = captures[3].parse().ok()?;
        if run_hour > 23 {
            return None;
        }
        let offset_hours: u32 = captures[4].parse().ok()?;

        Some(Self {
            variable: captures[1].to_string(),
            run_date,
            run_hour,
            offset_hours,
        })
    }

    /// Computes the frame's forecast-valid date and time of day.
    #[must_use]
    pub fn valid_time(&self) -> (NaiveDate, NaiveTime) {
        resolve_valid_time(self.run_date, self.run_hour, self.offset_hours)
    }
}

/// A decoded run-directory name, combined with the crawl context's
/// year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDirectory {
    /// Calendar date of the run.
    pub run_date: NaiveDate,
    /// Hour-of-day the run started, 0–23.
    pub run_hour: u32,
}

impl RunDirectory {
    /// Decodes a `<DD>_<HH>` run-directory name against the enclosing
    /// year and month.
    ///
    /// Returns `None` for names that do not fit the pattern, impossible
    /// dates (e.g. day 31 in June), or run hours ≥ 24.
    #[must_use]
    pub fn parse(name: &str, year: i32, month: u32) -> Option<Self> {
        let captures = RUN_DIR_PATTERN.captures(name)?;

        let day: u32 = captures[1].parse().ok()?;
        let run_hour: u32 = captures[2].parse().ok()?;
        if run_hour > 23 {
            return None;
        }
        let run_date = NaiveDate::from_ymd_opt(year, month, day)?;

        Some(Self { run_date, run_hour })
    }
}

/// Decodes a bare day-of-month directory name against the enclosing year
/// and month.
///
/// Returns `None` for non-numeric names and impossible dates.
#[must_use]
pub fn day_of_month(name: &str, year: i32, month: u32) -> Option<NaiveDate> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = name.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Computes the forecast-valid date and time from a run date, run hour, and
/// forecast-hour offset.
///
/// Integer division and modulo keep this correct for multi-day horizons
/// (offsets of 48 hours and beyond), not just single-day rollover.
#[must_use]
#[allow(clippy::expect_used, clippy::missing_panics_doc)]
pub fn resolve_valid_time(run_date: NaiveDate, run_hour: u32, offset_hours: u32) -> (NaiveDate, NaiveTime) {
    let total = run_hour + offset_hours;
    let days_forward = total / 24;
    let valid_hour = total % 24;

    let valid_date = run_date
        .checked_add_days(Days::new(u64::from(days_forward)))
        .expect("valid date within calendar range"); // offsets are bounded by filename digits
    let valid_time =
        NaiveTime::from_hms_opt(valid_hour, 0, 0).expect("hour is below 24 after modulo");

    (valid_date, valid_time)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_gridded_frame_parse_decodes_fields() {
        let frame = GriddedFrame::parse("t2-2025-06-24_06+09.png").unwrap();

        assert_eq!(frame.variable, "t2");
        assert_eq!(frame.run_date, date(2025, 6, 24));
        assert_eq!(frame.run_hour, 6);
        assert_eq!(frame.offset_hours, 9);
    }

    #[test]
    fn test_gridded_frame_valid_time_same_day() {
        let frame = GriddedFrame::parse("t2-2025-06-24_06+09.png").unwrap();
        let (valid_date, valid_time) = frame.valid_time();

        assert_eq!(valid_date, date(2025, 6, 24));
        assert_eq!(valid_time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
    }

    #[test]
    fn test_gridded_frame_valid_time_rolls_over_midnight() {
        let frame = GriddedFrame::parse("t2-2025-06-24_18+09.png").unwrap();
        let (valid_date, valid_time) = frame.valid_time();

        assert_eq!(valid_date, date(2025, 6, 25));
        assert_eq!(valid_time, NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }

    #[test]
    fn test_gridded_frame_parse_variable_with_hyphen() {
        let frame = GriddedFrame::parse("wspd10-max-2025-06-24_06+00.png").unwrap();
        assert_eq!(frame.variable, "wspd10-max");
        assert_eq!(frame.offset_hours, 0);
    }

    #[test]
    fn test_gridded_frame_parse_rejects_unrelated_names() {
        assert!(GriddedFrame::parse("randomfile.txt").is_none());
        assert!(GriddedFrame::parse("t2-2025-06-24_06+09.gif").is_none());
        assert!(GriddedFrame::parse("").is_none());
    }

    #[test]
    fn test_gridded_frame_parse_rejects_impossible_values() {
        // Hour 99 is not a run hour; Feb 31 is not a date.
        assert!(GriddedFrame::parse("t2-2025-06-24_99+09.png").is_none());
        assert!(GriddedFrame::parse("t2-2025-02-31_06+09.png").is_none());
    }

    #[test]
    fn test_run_directory_parse_combines_crawl_context() {
        let run = RunDirectory::parse("24_06", 2025, 6).unwrap();

        assert_eq!(run.run_date, date(2025, 6, 24));
        assert_eq!(run.run_hour, 6);
    }

    #[test]
    fn test_run_directory_parse_rejects_bad_names() {
        assert!(RunDirectory::parse("24", 2025, 6).is_none());
        assert!(RunDirectory::parse("24_6", 2025, 6).is_none());
        assert!(RunDirectory::parse("latest", 2025, 6).is_none());
        // Hour 25 and June 31 are impossible.
        assert!(RunDirectory::parse("24_25", 2025, 6).is_none());
        assert!(RunDirectory::parse("31_06", 2025, 6).is_none());
    }

    #[test]
    fn test_day_of_month_parses_numerals() {
        assert_eq!(day_of_month("24", 2025, 6), Some(date(2025, 6, 24)));
        assert_eq!(day_of_month("05", 2025, 6), Some(date(2025, 6, 5)));
    }

    #[test]
    fn test_day_of_month_rejects_non_numerals_and_bad_days() {
        assert!(day_of_month("latest", 2025, 6).is_none());
        assert!(day_of_month("", 2025, 6).is_none());
        assert!(day_of_month("32", 2025, 6).is_none());
        assert!(day_of_month("2a", 2025, 6).is_none());
    }

    #[test]
    fn test_resolve_valid_time_multi_day_horizon() {
        // 18 UTC run + 54 h = 72 h total: three days forward, midnight.
        let (valid_date, valid_time) = resolve_valid_time(date(2025, 6, 24), 18, 54);
        assert_eq!(valid_date, date(2025, 6, 27));
        assert_eq!(valid_time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());

        // 06 UTC run + 48 h lands two days forward at the same hour.
        let (valid_date, valid_time) = resolve_valid_time(date(2025, 6, 24), 6, 48);
        assert_eq!(valid_date, date(2025, 6, 26));
        assert_eq!(valid_time, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_valid_time_crosses_month_boundary() {
        let (valid_date, _) = resolve_valid_time(date(2025, 6, 30), 18, 9);
        assert_eq!(valid_date, date(2025, 7, 1));
    }

    #[test]
    fn test_resolve_valid_time_property_over_full_range() {
        // For every run hour and offset up to 72 h, the valid hour stays in
        // [0, 23] and the day delta equals (run_hour + offset) div 24.
        let run_date = date(2025, 6, 24);
        for run_hour in 0..=23u32 {
            for offset in 0..=72u32 {
                let (valid_date, valid_time) = resolve_valid_time(run_date, run_hour, offset);
                let expected_days = i64::from((run_hour + offset) / 24);

                assert_eq!(
                    (valid_date - run_date).num_days(),
                    expected_days,
                    "run_hour={run_hour} offset={offset}"
                );
                let hour = chrono::Timelike::hour(&valid_time);
                assert!(hour <= 23, "run_hour={run_hour} offset={offset}");
                assert_eq!(hour, (run_hour + offset) % 24);
            }
        }
    }
}
