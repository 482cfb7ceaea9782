//! Day arithmetic for scan windows.
//!
//! Month lengths come from a fixed 28/30/31 table. February is always 28 days,
//! so a window that crosses the 29th of February in a leap year skips it.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("month {0} is outside 1..=12")]
    InvalidMonth(u32),
    #[error("day {day} is not valid for month {month}")]
    InvalidDay { month: u32, day: u32 },
    #[error("cannot parse scan date from {0:?}")]
    Unparseable(String),
    #[error("{end} is not reachable by stepping forward from {start}")]
    Unreachable { start: String, end: String },
}

const YEAR_LENGTH: u32 = 365;

/// Number of days in `month` under the simplified table (no leap years).
pub fn month_length(month: u32) -> Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => Some(28),
        _ => None,
    }
}

/// A calendar day with no time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanDate {
    year: i32,
    month: u32,
    day: u32,
}

impl ScanDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, CalendarError> {
        let length = month_length(month).ok_or(CalendarError::InvalidMonth(month))?;
        if day == 0 || day > length {
            return Err(CalendarError::InvalidDay { month, day });
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Canonical `YYYY-MM-DD` key used by the availability calendar.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The date `amount` days later, carrying into following months and years.
    pub fn add_days(&self, amount: u32) -> ScanDate {
        // every table year has exactly this many days
        let mut year = self.year + (amount / YEAR_LENGTH) as i32;
        let mut month = self.month;
        let mut day = self.day + amount % YEAR_LENGTH;
        loop {
            let length = month_length(month).unwrap_or(31);
            if day <= length {
                break;
            }
            day -= length;
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
        ScanDate { year, month, day }
    }

    pub fn next_day(&self) -> ScanDate {
        self.add_days(1)
    }

    /// Inverse of `next_day` under the same month table.
    pub fn previous_day(&self) -> ScanDate {
        if self.day > 1 {
            return ScanDate { day: self.day - 1, ..*self };
        }
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        ScanDate {
            year,
            month,
            day: month_length(month).unwrap_or(31),
        }
    }

    /// Query fragment selecting a one-night stay starting on this date.
    pub fn stay_path(&self) -> String {
        format!("&checkin={}&checkout={}", self, self.next_day())
    }
}

impl fmt::Display for ScanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<NaiveDate> for ScanDate {
    type Error = CalendarError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        ScanDate::new(date.year(), date.month(), date.day())
    }
}

impl FromStr for ScanDate {
    type Err = CalendarError;

    /// Accepts `YYYY-MM-DD` and `MM/DD/YYYY`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let formats = ["%Y-%m-%d", "%m/%d/%Y"];
        for format in &formats {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return ScanDate::try_from(date);
            }
        }
        Err(CalendarError::Unparseable(text.to_string()))
    }
}

impl Serialize for ScanDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for ScanDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered one-shot sequence of days, produced by `inclusive_range`.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<ScanDate>,
    end_key: String,
}

impl Iterator for DateRange {
    type Item = ScanDate;

    fn next(&mut self) -> Option<ScanDate> {
        let current = self.next.take()?;
        if current.key() != self.end_key {
            self.next = Some(current.next_day());
        }
        Some(current)
    }
}

/// Every day from `start` to `end`, both included.
///
/// Stepping stops when the formatted day equals `end`'s, so `end` must come
/// on or after `start`.
pub fn inclusive_range(start: ScanDate, end: ScanDate) -> Result<DateRange, CalendarError> {
    if end < start {
        return Err(CalendarError::Unreachable {
            start: start.key(),
            end: end.key(),
        });
    }
    Ok(DateRange {
        next: Some(start),
        end_key: end.key(),
    })
}

/// The day after today on the local clock.
pub fn tomorrow() -> ScanDate {
    let today = Local::now().date_naive();
    match ScanDate::try_from(today) {
        Ok(date) => date.next_day(),
        // 29 February has no place in the table
        Err(_) => ScanDate {
            year: today.year(),
            month: 3,
            day: 1,
        },
    }
}

/// `start` plus the `count` days after it.
pub fn days_forward(start: ScanDate, count: u32) -> DateRange {
    DateRange {
        next: Some(start),
        end_key: start.add_days(count).key(),
    }
}
