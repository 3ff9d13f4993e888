//! Pre-compiled format patterns.
//!
//! The table is built once on first use and never mutated afterwards, so it
//! can be shared freely between threads working on distinct values.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;

use crate::precision::TemporalPrecision;

const YEAR: &str = "%Y";
const YEAR_MONTH: &str = "%Y-%m";
const YEAR_MONTH_DAY: &str = "%Y-%m-%d";
const YEAR_MONTH_DAY_TIME_MINS: &str = "%Y-%m-%dT%H:%M";
const YEAR_MONTH_DAY_TIME: &str = "%Y-%m-%dT%H:%M:%S";
const YEAR_MONTH_DAY_TIME_MILLI: &str = "%Y-%m-%dT%H:%M:%S%.3f";

// Medium en-US style, e.g. "Jan 5, 2012" and "Jan 5, 2012 12:00:00 PM"
const HUMAN_DATE: &str = "%b %-d, %Y";
const HUMAN_DATE_TIME: &str = "%b %-d, %Y %-I:%M:%S %p";

struct FormatTable {
    /// Indexed by `TemporalPrecision as usize`
    by_precision: Vec<Vec<Item<'static>>>,
    human_date: Vec<Item<'static>>,
    human_date_time: Vec<Item<'static>>,
}

static FORMATS: Lazy<FormatTable> = Lazy::new(|| {
    let compile = |pattern: &'static str| StrftimeItems::new(pattern).collect::<Vec<_>>();
    FormatTable {
        by_precision: TemporalPrecision::ALL
            .iter()
            .map(|precision| compile(pattern_for(*precision)))
            .collect(),
        human_date: compile(HUMAN_DATE),
        human_date_time: compile(HUMAN_DATE_TIME),
    }
});

/// The strftime pattern used to render a value at the given precision,
/// without any zone suffix.
pub fn pattern_for(precision: TemporalPrecision) -> &'static str {
    match precision {
        TemporalPrecision::Year => YEAR,
        TemporalPrecision::Month => YEAR_MONTH,
        TemporalPrecision::Day => YEAR_MONTH_DAY,
        TemporalPrecision::Minute => YEAR_MONTH_DAY_TIME_MINS,
        TemporalPrecision::Second => YEAR_MONTH_DAY_TIME,
        TemporalPrecision::Milli => YEAR_MONTH_DAY_TIME_MILLI,
    }
}

/// Renders the wall-clock reading of `dt` at `precision`.
pub(crate) fn render(dt: &DateTime<FixedOffset>, precision: TemporalPrecision) -> String {
    let items = &FORMATS.by_precision[precision as usize];
    dt.format_with_items(items.iter()).to_string()
}

/// Renders `dt` for people: date only for date precisions, date and time
/// otherwise.
pub(crate) fn render_human(dt: &DateTime<FixedOffset>, precision: TemporalPrecision) -> String {
    let items = if precision.has_time() {
        &FORMATS.human_date_time
    } else {
        &FORMATS.human_date
    };
    dt.format_with_items(items.iter()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2012, 1, 5, 14, 3, 9)
            .unwrap()
            + chrono::Duration::milliseconds(7)
    }

    #[test]
    fn test_render_each_precision() {
        let dt = sample();
        assert_eq!(render(&dt, TemporalPrecision::Year), "2012");
        assert_eq!(render(&dt, TemporalPrecision::Month), "2012-01");
        assert_eq!(render(&dt, TemporalPrecision::Day), "2012-01-05");
        assert_eq!(render(&dt, TemporalPrecision::Minute), "2012-01-05T14:03");
        assert_eq!(render(&dt, TemporalPrecision::Second), "2012-01-05T14:03:09");
        assert_eq!(render(&dt, TemporalPrecision::Milli), "2012-01-05T14:03:09.007");
    }

    #[test]
    fn test_render_human() {
        let dt = sample();
        assert_eq!(render_human(&dt, TemporalPrecision::Day), "Jan 5, 2012");
        assert_eq!(render_human(&dt, TemporalPrecision::Second), "Jan 5, 2012 2:03:09 PM");
    }
}
