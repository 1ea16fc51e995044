// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Temporal parsing, calendar ticks and tick label formatting.
//!
//! Time is modelled as a numeric value in **seconds** since the Unix epoch (UTC), so time
//! scales can share the linear scale machinery.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use cubeviz_core::TimeUnit;

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "toolchains with these methods in `core` resolve them inherently")]
use crate::float::FloatExt;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const MONTH: f64 = 30.0 * DAY;
const YEAR: f64 = 365.0 * DAY;

/// Parses a temporal dimension value into seconds.
///
/// `format` is a `strftime`-style pattern (`%Y`, `%Y-%m`, `%d.%m.%Y`, ...). Patterns without a
/// day or month default those parts to the first. Without a pattern, RFC 3339 and ISO
/// dates, months and years are tried in turn.
pub fn parse_temporal(value: &str, format: Option<&str>) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(fmt) = format
        && let Some(dt) = parse_with(value, fmt)
    {
        return Some(seconds(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp() as f64);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d", "%Y-%m", "%Y"]
        .iter()
        .find_map(|fmt| parse_with(value, fmt))
        .map(seconds)
}

fn parse_with(value: &str, fmt: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
        return d.and_hms_opt(0, 0, 0);
    }
    if fmt.contains("%d") || fmt.contains("%e") || fmt.contains("%j") {
        return None;
    }
    let (value, fmt) = if fmt.contains("%m") {
        (format!("{value}-01"), format!("{fmt}-%d"))
    } else {
        (format!("{value}-01-01"), format!("{fmt}-%m-%d"))
    };
    NaiveDate::parse_from_str(&value, &fmt)
        .ok()?
        .and_hms_opt(0, 0, 0)
}

fn seconds(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64
}

fn datetime(t: f64) -> Option<DateTime<Utc>> {
    if !t.is_finite() {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "chrono rejects out-of-range timestamps"
    )]
    let secs = t.floor() as i64;
    DateTime::from_timestamp(secs, 0)
}

fn year_start(year: i32) -> Option<f64> {
    NaiveDate::from_ymd_opt(year, 1, 1)?
        .and_hms_opt(0, 0, 0)
        .map(seconds)
}

fn month_start(year: i32, month: u32) -> Option<f64> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(seconds)
}

/// Calendar-aligned tick values inside `[min, max]` (seconds).
///
/// Spans of years tick on January 1st, spans of months on the first of a month, shorter
/// spans on multiples of a fixed step.
pub fn nice_time_ticks(mut min: f64, mut max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return alloc::vec![min];
    }
    if min > max {
        core::mem::swap(&mut min, &mut max);
    }
    let step0 = (max - min) / count as f64;
    let (Some(from), Some(to)) = (datetime(min), datetime(max)) else {
        return Vec::new();
    };

    if step0 >= 0.9 * YEAR {
        let every = year_step(step0 / YEAR);
        return (from.year()..=to.year() + 1)
            .filter(|y| y.rem_euclid(every) == 0)
            .filter_map(year_start)
            .filter(|t| *t >= min && *t <= max)
            .collect();
    }
    if step0 >= 0.9 * MONTH {
        let every = [1_u32, 2, 3, 6]
            .into_iter()
            .find(|m| f64::from(*m) * MONTH >= step0)
            .unwrap_or(6);
        let mut ticks = Vec::new();
        for year in from.year()..=to.year() {
            for month in (1..=12).filter(|m| (m - 1) % every == 0) {
                if let Some(t) = month_start(year, month)
                    && t >= min
                    && t <= max
                {
                    ticks.push(t);
                }
            }
        }
        return ticks;
    }

    let step = fixed_step(step0);
    let start = (min / step).ceil() * step;
    let n = ((max - start) / step).floor().clamp(0.0, 10_000.0);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "clamped to [0, 10k] above"
    )]
    let n = n as u64;
    (0..=n).map(|i| start + step * i as f64).collect()
}

fn year_step(years: f64) -> i32 {
    const STEPS: [i32; 7] = [1, 2, 5, 10, 20, 50, 100];
    STEPS
        .into_iter()
        .find(|s| f64::from(*s) >= years)
        .unwrap_or(100)
}

fn fixed_step(step: f64) -> f64 {
    const STEPS: &[f64] = &[
        1.0,
        5.0,
        15.0,
        30.0,
        MINUTE,
        5.0 * MINUTE,
        15.0 * MINUTE,
        30.0 * MINUTE,
        HOUR,
        3.0 * HOUR,
        6.0 * HOUR,
        12.0 * HOUR,
        DAY,
        2.0 * DAY,
        WEEK,
        2.0 * WEEK,
    ];
    STEPS
        .iter()
        .copied()
        .find(|s| *s >= step)
        .unwrap_or(2.0 * WEEK)
}

/// Formats a timestamp at the granularity of `unit`.
pub fn format_time(t: f64, unit: Option<TimeUnit>) -> String {
    let Some(dt) = datetime(t) else {
        return String::from(crate::format::MISSING_VALUE);
    };
    let pattern = match unit {
        Some(TimeUnit::Year) => "%Y",
        Some(TimeUnit::Month) => "%m.%Y",
        Some(TimeUnit::Week | TimeUnit::Day) | None => "%d.%m.%Y",
        Some(TimeUnit::Hour | TimeUnit::Minute) => "%d.%m.%Y %H:%M",
        Some(TimeUnit::Second) => "%d.%m.%Y %H:%M:%S",
    };
    dt.format(pattern).to_string()
}

/// Formats a tick (seconds) given the tick spacing.
pub fn format_time_tick(t: f64, step: f64) -> String {
    let unit = if step >= 0.9 * YEAR {
        TimeUnit::Year
    } else if step >= 0.9 * MONTH {
        TimeUnit::Month
    } else if step >= DAY {
        TimeUnit::Day
    } else {
        TimeUnit::Minute
    };
    format_time(t, Some(unit))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn parses_years_months_and_days() {
        let y2020 = parse_temporal("2020", Some("%Y")).unwrap();
        assert_eq!(y2020, 1_577_836_800.0);
        assert_eq!(parse_temporal("2020", None), Some(y2020));
        assert_eq!(parse_temporal("2020-01-01", None), Some(y2020));
        assert_eq!(parse_temporal("01.2020", Some("%m.%Y")), Some(y2020));
        assert_eq!(parse_temporal("2020-01-01T00:00:00Z", None), Some(y2020));
        assert_eq!(parse_temporal("not a date", None), None);
    }

    #[test]
    fn yearly_ticks_land_on_january_first() {
        let a = parse_temporal("2000", None).unwrap();
        let b = parse_temporal("2010", None).unwrap();
        let ticks = nice_time_ticks(a, b, 5);
        assert_eq!(ticks.first().copied(), Some(a));
        assert_eq!(ticks.last().copied(), Some(b));
        assert!(ticks.iter().all(|t| format_time(*t, Some(TimeUnit::Day)).starts_with("01.01.")));
    }

    #[test]
    fn monthly_ticks_for_a_year_span() {
        let a = parse_temporal("2020-01", None).unwrap();
        let b = parse_temporal("2020-12", None).unwrap();
        let ticks = nice_time_ticks(a, b, 4);
        assert_eq!(ticks.len(), 4);
        assert_eq!(format_time_tick(ticks[1], MONTH * 3.0), "04.2020");
    }

    #[test]
    fn formats_by_unit() {
        let t = parse_temporal("2021-03-04", None).unwrap();
        assert_eq!(format_time(t, Some(TimeUnit::Year)), "2021");
        assert_eq!(format_time(t, Some(TimeUnit::Day)), "04.03.2021");
        assert_eq!(format_time(f64::NAN, None), "-");
    }
}
