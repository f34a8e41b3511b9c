//! HTTP date handling over unix seconds.
//!
//! Parsing accepts the three forms servers still emit: RFC 1123
//! (`Sun, 06 Nov 1994 08:49:37 GMT`), RFC 850
//! (`Sunday, 06-Nov-94 08:49:37 GMT`) and asctime
//! (`Sun Nov  6 08:49:37 1994`). Output is always RFC 1123 with the weekday
//! computed, never copied from the input.

use std::fmt;

use super::HeaderError;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// 1970-01-01 was a Thursday.
const WEEKDAYS: [&str; 7] = ["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"];

/// An HTTP date, stored as seconds since the unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpDate(u64);

impl HttpDate {
    pub fn from_unix(seconds: u64) -> Self {
        HttpDate(seconds)
    }

    pub fn unix_seconds(&self) -> u64 {
        self.0
    }

    /// Parses any of the three date forms.
    pub fn parse(value: &str) -> Result<Self, HeaderError> {
        Self::decode("Date", value)
    }

    pub(crate) fn decode(name: &'static str, value: &str) -> Result<Self, HeaderError> {
        parse_rfc1123(value)
            .or_else(|| parse_rfc850(value))
            .or_else(|| parse_asctime(value))
            .map(HttpDate)
            .ok_or_else(|| HeaderError::malformed(name, value, "unrecognized date form"))
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / 86_400;
        let tod = self.0 % 86_400;
        let (year, month, day) = ymd_from_days(days);
        write!(
            f,
            "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[(days % 7) as usize],
            day,
            MONTHS[(month - 1) as usize],
            year,
            tod / 3600,
            (tod % 3600) / 60,
            tod % 60
        )
    }
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(month: u64, year: u64) -> u64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn days_from_ymd(year: u64, month: u64, day: u64) -> Option<u64> {
    if !(1970..=9999).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    if day < 1 || day > days_in_month(month, year) {
        return None;
    }
    let mut days = 0;
    for y in 1970..year {
        days += if is_leap_year(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += days_in_month(m, year);
    }
    Some(days + day - 1)
}

fn ymd_from_days(mut days: u64) -> (u64, u64, u64) {
    let mut year = 1970;
    loop {
        let len = if is_leap_year(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }
    let mut month = 1;
    while days >= days_in_month(month, year) {
        days -= days_in_month(month, year);
        month += 1;
    }
    (year, month, days + 1)
}

fn month_number(name: &str) -> Option<u64> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u64 + 1)
}

fn to_seconds(year: u64, month: u64, day: u64, h: u64, m: u64, s: u64) -> Option<u64> {
    if h > 23 || m > 59 || s > 60 {
        return None;
    }
    Some(days_from_ymd(year, month, day)? * 86_400 + h * 3600 + m * 60 + s)
}

fn parse_hms(text: &str) -> Option<(u64, u64, u64)> {
    let mut parts = text.split(':');
    let h = parts.next()?.parse().ok()?;
    let m = parts.next()?.parse().ok()?;
    let s = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((h, m, s))
}

/// `Sun, 06 Nov 1994 08:49:37 GMT`
fn parse_rfc1123(value: &str) -> Option<u64> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 6 || !parts[0].ends_with(',') || parts[5] != "GMT" {
        return None;
    }
    let day = parts[1].parse().ok()?;
    let month = month_number(parts[2])?;
    let year = parts[3].parse().ok()?;
    let (h, m, s) = parse_hms(parts[4])?;
    to_seconds(year, month, day, h, m, s)
}

/// `Sunday, 06-Nov-94 08:49:37 GMT`
fn parse_rfc850(value: &str) -> Option<u64> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 4 || !parts[0].ends_with(',') || parts[3] != "GMT" {
        return None;
    }
    let mut date = parts[1].split('-');
    let day = date.next()?.parse().ok()?;
    let month = month_number(date.next()?)?;
    let year: u64 = date.next()?.parse().ok()?;
    if date.next().is_some() {
        return None;
    }
    // Two-digit years: 70..=99 mean 19xx, anything below rolls forward.
    let year = if year < 70 {
        2000 + year
    } else if year < 100 {
        1900 + year
    } else {
        year
    };
    let (h, m, s) = parse_hms(parts[2])?;
    to_seconds(year, month, day, h, m, s)
}

/// `Sun Nov  6 08:49:37 1994`
fn parse_asctime(value: &str) -> Option<u64> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }
    let month = month_number(parts[1])?;
    let day = parts[2].parse().ok()?;
    let (h, m, s) = parse_hms(parts[3])?;
    let year = parts[4].parse().ok()?;
    to_seconds(year, month, day, h, m, s)
}
