//! Date interval parsing for the `--interval` flag.
//!
//! Supported forms:
//! - `2024-01-01..2024-01-31`: absolute range, begin at 00:00:00 UTC
//!   and end at 23:59:59 UTC
//! - `2024-01-15`: a single day
//! - `30d` / `4w`: the last N days/weeks ending now

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Parse an interval spec into an inclusive `[begin, end]` pair.
pub fn parse_interval(spec: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let spec = spec.trim();
    if spec.is_empty() {
        bail!("interval is empty");
    }

    if let Some((begin_part, end_part)) = spec.split_once("..") {
        let begin = day_start(begin_part)?;
        let end = day_end(end_part)?;
        if begin > end {
            bail!("interval begin '{begin_part}' is after end '{end_part}'");
        }
        return Ok((begin, end));
    }

    if let Some(span) = parse_relative(spec) {
        let end = Utc::now();
        return Ok((end - span, end));
    }

    let begin = day_start(spec)?;
    let end = day_end(spec)?;
    Ok((begin, end))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}

fn day_start(value: &str) -> Result<DateTime<Utc>> {
    Ok(parse_date(value)?.and_time(NaiveTime::MIN).and_utc())
}

fn day_end(value: &str) -> Result<DateTime<Utc>> {
    Ok(day_start(value)? + Duration::days(1) - Duration::seconds(1))
}

fn parse_relative(value: &str) -> Option<Duration> {
    let unit = value.chars().last()?;
    let count: i64 = value[..value.len() - unit.len_utf8()].parse().ok()?;
    if count <= 0 {
        return None;
    }
    match unit {
        'd' => Some(Duration::days(count)),
        'w' => Some(Duration::weeks(count)),
        _ => None,
    }
}
