// src/dates.rs
//! Date normalizer.
//!
//! Date spans come out of the extractor as `[year, month, day, hour?, minute?]`
//! token lists. Conversion is total: anything that does not make a real
//! calendar time becomes `None`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::consts::{DAY_FORMAT, STAMP_FORMAT};
use crate::error::{Error, Result};

const MINUTE: usize = 4;

/// Token list → integer components. `null` reads as 0; an unreadable minute
/// reads as 0; any other unreadable component rejects the list.
pub fn parse_components(tokens: &[String]) -> Option<Vec<i64>> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let t = t.replace('"', "");
            let t = t.trim();
            if t == "null" {
                return Some(0);
            }
            match t.parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) if i == MINUTE => Some(0),
                Err(_) => None,
            }
        })
        .collect()
}

/// `[y, m, d]`, `[y, m, d, h]` or `[y, m, d, h, min]`; missing trailing parts are 0.
pub fn from_components(c: &[i64]) -> Option<NaiveDateTime> {
    let (y, mo, d, h, mi) = match *c {
        [y, mo, d] => (y, mo, d, 0, 0),
        [y, mo, d, h] => (y, mo, d, h, 0),
        [y, mo, d, h, mi] => (y, mo, d, h, mi),
        _ => return None,
    };
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(y).ok()?,
        u32::try_from(mo).ok()?,
        u32::try_from(d).ok()?,
    )?;
    let time = NaiveTime::from_hms_opt(u32::try_from(h).ok()?, u32::try_from(mi).ok()?, 0)?;
    Some(date.and_time(time))
}

pub fn to_datetime(tokens: &[String]) -> Option<NaiveDateTime> {
    from_components(&parse_components(tokens)?)
}

/// Query reference date: `YYYY-MM-DD`, optionally with a time.
pub fn parse_query_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| Error::InvalidDate(s!(s)))
}

pub fn format_stamp(dt: Option<NaiveDateTime>) -> String {
    dt.map(|d| d.format(STAMP_FORMAT).to_string()).unwrap_or_default()
}

/// Calendar day used in journey identities (`15-03-2024`).
pub fn format_day(dt: Option<NaiveDateTime>) -> String {
    dt.map(|d| d.format(DAY_FORMAT).to_string()).unwrap_or_default()
}

pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

/// Whole days from `query` to `departure`, rounded down.
pub fn days_until(departure: NaiveDateTime, query: NaiveDateTime) -> i64 {
    (departure - query).num_seconds().div_euclid(86_400)
}
