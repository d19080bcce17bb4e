//! Precision-aware Date, DateTime and Time values
//!
//! Partial values (`@2015`, `@2015-02`, `@T14`) keep only the components that
//! were written. Comparisons walk the components from most to least
//! significant; when one side runs out of components before a difference is
//! found the result is "not comparable" (`None`), never `false`.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Precision for temporal values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl fmt::Display for DateTimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
            Self::Hour => write!(f, "hour"),
            Self::Minute => write!(f, "minute"),
            Self::Second => write!(f, "second"),
            Self::Millisecond => write!(f, "millisecond"),
        }
    }
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub(crate) fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Parse a fixed-width run of ASCII digits
fn fixed_digits<T: std::str::FromStr>(s: &str, width: usize) -> Option<T> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fractional seconds to milliseconds: `5` -> 500, `123456` -> 123
fn fraction_to_millis(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut digits: String = s.chars().take(3).collect();
    while digits.len() < 3 {
        digits.push('0');
    }
    digits.parse().ok()
}

/// Component-wise comparison; seconds and milliseconds count as one precision
fn compare_components(a: &[Option<u32>], b: &[Option<u32>]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match (x, y) {
            (Some(x), Some(y)) => match x.cmp(y) {
                Ordering::Equal => continue,
                other => return Some(other),
            },
            (None, None) => return Some(Ordering::Equal),
            _ => return None,
        }
    }
    Some(Ordering::Equal)
}

// ============================================================================
// Date
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FhirPathDate {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl FhirPathDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    pub fn year_only(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn year_month(year: i32, month: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month() as u8, date.day() as u8)
    }

    pub fn precision(&self) -> DateTimePrecision {
        match (self.month, self.day) {
            (None, _) => DateTimePrecision::Year,
            (Some(_), None) => DateTimePrecision::Month,
            (Some(_), Some(_)) => DateTimePrecision::Day,
        }
    }

    /// Full-precision dates only
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        match (self.month, self.day) {
            (Some(month), Some(day)) => NaiveDate::from_ymd_opt(self.year, month as u32, day as u32),
            _ => None,
        }
    }

    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, with an optional `@` prefix
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let mut parts = s.split('-');
        let year: i32 = fixed_digits(parts.next()?, 4)?;
        let month: Option<u8> = match parts.next() {
            Some(m) => Some(fixed_digits(m, 2)?),
            None => None,
        };
        let day: Option<u8> = match parts.next() {
            Some(d) => Some(fixed_digits(d, 2)?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        let date = Self { year, month, day };
        date.is_valid().then_some(date)
    }

    fn is_valid(&self) -> bool {
        match (self.month, self.day) {
            (None, None) => true,
            (Some(m), None) => (1..=12).contains(&m),
            (Some(m), Some(d)) => (1..=12).contains(&m) && d >= 1 && d <= days_in_month(self.year, m),
            (None, Some(_)) => false,
        }
    }

    fn components(&self) -> [Option<u32>; 3] {
        [
            Some(self.year as u32),
            self.month.map(u32::from),
            self.day.map(u32::from),
        ]
    }

    /// Ordering, or `None` when precision differs and the common part is equal
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        compare_components(&self.components(), &other.components())
    }
}

impl fmt::Display for FhirPathDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// DateTime
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FhirPathDateTime {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
    /// Offset from UTC in minutes
    pub timezone_offset: Option<i16>,
}

impl FhirPathDateTime {
    pub fn from_date(date: &FhirPathDate) -> Self {
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: None,
            minute: None,
            second: None,
            millisecond: None,
            timezone_offset: None,
        }
    }

    /// Full-precision value from a chrono timestamp
    pub fn from_chrono(dt: &chrono::DateTime<FixedOffset>) -> Self {
        Self {
            year: dt.year(),
            month: Some(dt.month() as u8),
            day: Some(dt.day() as u8),
            hour: Some(dt.hour() as u8),
            minute: Some(dt.minute() as u8),
            second: Some(dt.second() as u8),
            millisecond: Some((dt.nanosecond() / 1_000_000).min(999) as u16),
            timezone_offset: Some((dt.offset().local_minus_utc() / 60) as i16),
        }
    }

    pub fn precision(&self) -> DateTimePrecision {
        if self.millisecond.is_some() {
            DateTimePrecision::Millisecond
        } else if self.second.is_some() {
            DateTimePrecision::Second
        } else if self.minute.is_some() {
            DateTimePrecision::Minute
        } else if self.hour.is_some() {
            DateTimePrecision::Hour
        } else if self.day.is_some() {
            DateTimePrecision::Day
        } else if self.month.is_some() {
            DateTimePrecision::Month
        } else {
            DateTimePrecision::Year
        }
    }

    pub fn date(&self) -> FhirPathDate {
        FhirPathDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    /// Parse an ISO 8601 datetime, with an optional `@` prefix
    ///
    /// Accepts `2015`, `2015-02-04T`, `2015-02-04T14:34`,
    /// `2015-02-04T14:34:28.123+01:00`, `2015-02-04T14:34:28Z`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let (date_str, time_str) = match s.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (s, None),
        };
        let date = FhirPathDate::parse(date_str)?;
        let mut result = Self::from_date(&date);

        let Some(time_str) = time_str.filter(|t| !t.is_empty()) else {
            return Some(result);
        };
        if date.day.is_none() {
            return None;
        }

        let (clock, offset) = split_timezone(time_str)?;
        let time = FhirPathTime::parse(clock)?;
        result.hour = Some(time.hour);
        result.minute = time.minute;
        result.second = time.second;
        result.millisecond = time.millisecond;
        result.timezone_offset = offset;
        Some(result)
    }

    /// Earliest instant covered, as a naive timestamp
    pub fn to_naive_low(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year,
            self.month.unwrap_or(1) as u32,
            self.day.unwrap_or(1) as u32,
        )?;
        let time = NaiveTime::from_hms_milli_opt(
            self.hour.unwrap_or(0) as u32,
            self.minute.unwrap_or(0) as u32,
            self.second.unwrap_or(0) as u32,
            self.millisecond.unwrap_or(0) as u32,
        )?;
        Some(NaiveDateTime::new(date, time))
    }

    /// Rebuild from a naive timestamp keeping this value's precision and offset
    pub fn with_naive(&self, ts: NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: self.month.map(|_| ts.month() as u8),
            day: self.day.map(|_| ts.day() as u8),
            hour: self.hour.map(|_| ts.hour() as u8),
            minute: self.minute.map(|_| ts.minute() as u8),
            second: self.second.map(|_| ts.second() as u8),
            millisecond: self
                .millisecond
                .map(|_| (ts.nanosecond() / 1_000_000).min(999) as u16),
            timezone_offset: self.timezone_offset,
        }
    }

    /// Shift to UTC when both an offset and a time of day are present
    fn normalized(&self) -> Self {
        match (self.timezone_offset, self.hour) {
            (Some(offset), Some(_)) if offset != 0 => self
                .to_naive_low()
                .and_then(|ts| ts.checked_sub_signed(chrono::Duration::minutes(offset as i64)))
                .map(|ts| {
                    let mut utc = self.with_naive(ts);
                    utc.timezone_offset = Some(0);
                    utc
                })
                .unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }

    fn components(&self) -> [Option<u32>; 6] {
        let seconds = self
            .second
            .map(|s| s as u32 * 1000 + self.millisecond.unwrap_or(0) as u32);
        [
            Some(self.year as u32),
            self.month.map(u32::from),
            self.day.map(u32::from),
            self.hour.map(u32::from),
            self.minute.map(u32::from),
            seconds,
        ]
    }

    /// Ordering after normalizing offsets, or `None` when not comparable
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.normalized(), other.normalized());
        compare_components(&a.components(), &b.components())
    }
}

/// Split `14:34:28+01:00` into the clock part and the offset in minutes
fn split_timezone(s: &str) -> Option<(&str, Option<i16>)> {
    if let Some(clock) = s.strip_suffix('Z') {
        return Some((clock, Some(0)));
    }
    match s.find(['+', '-']) {
        Some(idx) => {
            let negative = s[idx..].starts_with('-');
            let (hours, minutes) = s[idx + 1..].split_once(':')?;
            let hours: i16 = fixed_digits(hours, 2)?;
            let minutes: i16 = fixed_digits(minutes, 2)?;
            if hours > 14 || minutes > 59 {
                return None;
            }
            let offset = hours * 60 + minutes;
            Some((&s[..idx], Some(if negative { -offset } else { offset })))
        }
        None => Some((s, None)),
    }
}

impl fmt::Display for FhirPathDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date())?;
        let Some(hour) = self.hour else {
            return Ok(());
        };
        write!(f, "T{:02}", hour)?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
                if let Some(ms) = self.millisecond {
                    write!(f, ".{:03}", ms)?;
                }
            }
        }
        match self.timezone_offset {
            Some(0) => write!(f, "Z"),
            Some(offset) => {
                let sign = if offset >= 0 { '+' } else { '-' };
                write!(f, "{}{:02}:{:02}", sign, offset.abs() / 60, offset.abs() % 60)
            }
            None => Ok(()),
        }
    }
}

// ============================================================================
// Time
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FhirPathTime {
    pub hour: u8,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
}

impl FhirPathTime {
    pub fn new(hour: u8, minute: u8, second: u8, millisecond: u16) -> Self {
        Self {
            hour,
            minute: Some(minute),
            second: Some(second),
            millisecond: Some(millisecond),
        }
    }

    pub fn hour_minute(hour: u8, minute: u8) -> Self {
        Self {
            hour,
            minute: Some(minute),
            second: None,
            millisecond: None,
        }
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        Self::new(
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
            (time.nanosecond() / 1_000_000).min(999) as u16,
        )
    }

    pub fn precision(&self) -> DateTimePrecision {
        if self.millisecond.is_some() {
            DateTimePrecision::Millisecond
        } else if self.second.is_some() {
            DateTimePrecision::Second
        } else if self.minute.is_some() {
            DateTimePrecision::Minute
        } else {
            DateTimePrecision::Hour
        }
    }

    /// Milliseconds since midnight, missing components counted as zero
    pub fn to_milliseconds(&self) -> i64 {
        let hour = self.hour as i64;
        let minute = self.minute.unwrap_or(0) as i64;
        let second = self.second.unwrap_or(0) as i64;
        ((hour * 60 + minute) * 60 + second) * 1000 + self.millisecond.unwrap_or(0) as i64
    }

    /// Parse `hh`, `hh:mm`, `hh:mm:ss` or `hh:mm:ss.fff`, with an optional `@T` or `T` prefix
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let s = s.strip_prefix('T').unwrap_or(s);

        let (clock, fraction) = match s.split_once('.') {
            Some((c, f)) => (c, Some(fraction_to_millis(f)?)),
            None => (s, None),
        };

        let mut parts = clock.split(':');
        let hour: u8 = fixed_digits(parts.next()?, 2)?;
        let minute: Option<u8> = match parts.next() {
            Some(m) => Some(fixed_digits(m, 2)?),
            None => None,
        };
        let second: Option<u8> = match parts.next() {
            Some(sec) => Some(fixed_digits(sec, 2)?),
            None => None,
        };
        if parts.next().is_some() || (fraction.is_some() && second.is_none()) {
            return None;
        }
        if hour > 23 || minute.is_some_and(|m| m > 59) || second.is_some_and(|s| s > 59) {
            return None;
        }
        Some(Self {
            hour,
            minute,
            second,
            millisecond: fraction,
        })
    }

    fn components(&self) -> [Option<u32>; 3] {
        let seconds = self
            .second
            .map(|s| s as u32 * 1000 + self.millisecond.unwrap_or(0) as u32);
        [Some(self.hour as u32), self.minute.map(u32::from), seconds]
    }

    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        compare_components(&self.components(), &other.components())
    }
}

impl fmt::Display for FhirPathTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.hour)?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
                if let Some(ms) = self.millisecond {
                    write!(f, ".{:03}", ms)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("2015", DateTimePrecision::Year)]
    #[case("2015-02", DateTimePrecision::Month)]
    #[case("@2015-02-04", DateTimePrecision::Day)]
    fn test_date_parse_precision(#[case] input: &str, #[case] precision: DateTimePrecision) {
        let date = FhirPathDate::parse(input).unwrap();
        assert_eq!(date.precision(), precision);
        assert_eq!(date.to_string(), input.trim_start_matches('@'));
    }

    #[rstest]
    #[case("2015-13")]
    #[case("2015-02-30")]
    #[case("15-02-03")]
    #[case("2015-2-03")]
    fn test_date_parse_rejects(#[case] input: &str) {
        assert_eq!(FhirPathDate::parse(input), None);
    }

    #[test]
    fn test_leap_day() {
        assert!(FhirPathDate::parse("2016-02-29").is_some());
        assert!(FhirPathDate::parse("2015-02-29").is_none());
    }

    #[test]
    fn test_date_compare_partial() {
        let a = FhirPathDate::parse("2012").unwrap();
        let b = FhirPathDate::parse("2012-01").unwrap();
        let c = FhirPathDate::parse("2013-01").unwrap();
        assert_eq!(a.compare(&b), None);
        assert_eq!(b.compare(&c), Some(Ordering::Less));
        assert_eq!(a.compare(&c), Some(Ordering::Less));
    }

    #[test]
    fn test_datetime_parse() {
        let dt = FhirPathDateTime::parse("@2015-02-04T14:34:28.123+01:00").unwrap();
        assert_eq!(dt.hour, Some(14));
        assert_eq!(dt.millisecond, Some(123));
        assert_eq!(dt.timezone_offset, Some(60));
        assert_eq!(dt.to_string(), "2015-02-04T14:34:28.123+01:00");

        let dt = FhirPathDateTime::parse("2015-02-04T").unwrap();
        assert_eq!(dt.precision(), DateTimePrecision::Day);

        let dt = FhirPathDateTime::parse("2015-02-04T10:00:00.5Z").unwrap();
        assert_eq!(dt.millisecond, Some(500));
        assert_eq!(dt.timezone_offset, Some(0));
    }

    #[test]
    fn test_datetime_compare_across_offsets() {
        let a = FhirPathDateTime::parse("2017-11-05T01:30:00.0-04:00").unwrap();
        let b = FhirPathDateTime::parse("2017-11-05T05:30:00.0Z").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_datetime_seconds_and_millis_are_one_precision() {
        let a = FhirPathDateTime::parse("2015-02-04T10:00:00").unwrap();
        let b = FhirPathDateTime::parse("2015-02-04T10:00:00.000").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
        let c = FhirPathDateTime::parse("2015-02-04T10:00").unwrap();
        assert_eq!(a.compare(&c), None);
    }

    #[test]
    fn test_time_parse_and_compare() {
        let t = FhirPathTime::parse("@T14:34:28.5").unwrap();
        assert_eq!(t.millisecond, Some(500));
        assert_eq!(t.to_string(), "14:34:28.500");
        assert!(FhirPathTime::parse("24:00").is_none());

        let a = FhirPathTime::parse("10:00").unwrap();
        let b = FhirPathTime::parse("10:00:00").unwrap();
        let c = FhirPathTime::parse("11").unwrap();
        assert_eq!(a.compare(&b), None);
        assert_eq!(a.compare(&c), Some(Ordering::Less));
    }
}
