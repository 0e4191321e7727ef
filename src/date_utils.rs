use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

pub const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// An aggregation bucket: a whole year, or one month of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl PeriodKey {
    pub fn month(year: i32, month: u32) -> Result<Self, ChartError> {
        if !(1..=12).contains(&month) {
            return Err(ChartError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self {
            year,
            month: Some(month),
        })
    }

    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    /// First and last day covered by this period.
    pub fn date_bounds(&self) -> Result<(NaiveDate, NaiveDate), ChartError> {
        let invalid = || ChartError::InvalidPeriod(format!("{self:?} is out of range"));
        match self.month {
            Some(month) => {
                let start = NaiveDate::from_ymd_opt(self.year, month, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(self.year, month, days_in_month(self.year, month))
                    .ok_or_else(invalid)?;
                Ok((start, end))
            }
            None => {
                let start = NaiveDate::from_ymd_opt(self.year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(self.year, 12, 31).ok_or_else(invalid)?;
                Ok((start, end))
            }
        }
    }

    /// `YYYY-MM-DD` bounds, as stored in the database.
    pub fn date_strings(&self) -> Result<(String, String), ChartError> {
        let (from, to) = self.date_bounds()?;
        Ok((
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string(),
        ))
    }

    /// "January 2024" for a month, "2024" for a year.
    pub fn label(&self) -> String {
        match self.month {
            Some(month) => format!("{} {}", month_name(month), self.year),
            None => self.year.to_string(),
        }
    }

    /// "Jan 2024"; years render as just the number.
    pub fn short_label(&self) -> String {
        match self.month {
            Some(month) => format!("{} {}", short_month_name(month), self.year),
            None => self.year.to_string(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && self.month.map_or(true, |m| date.month() == m)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:02}-{}", month, self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Month,
    Year,
}

impl FromStr for PeriodType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(ChartError::InvalidPeriod(format!(
                "unknown period type '{other}'"
            ))),
        }
    }
}

impl PeriodType {
    /// Resolve a `{type, value, year?}` selector into a period. For months the
    /// year is required; for years `value` is the year itself.
    pub fn resolve(&self, value: i32, year: Option<i32>) -> Result<PeriodKey, ChartError> {
        match self {
            Self::Month => {
                let year = year.ok_or_else(|| {
                    ChartError::InvalidPeriod("year is required when period type is month".into())
                })?;
                let month = u32::try_from(value).map_err(|_| {
                    ChartError::InvalidPeriod(format!("month must be positive, got {value}"))
                })?;
                PeriodKey::month(year, month)
            }
            Self::Year => Ok(PeriodKey::year(value)),
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

pub fn short_month_name(month: u32) -> &'static str {
    SHORT_MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// The `count` months ending with (and including) `end`, oldest first.
pub fn months_ending_at(end_year: i32, end_month: u32, count: usize) -> Vec<PeriodKey> {
    let mut months = Vec::with_capacity(count);
    let mut year = end_year;
    let mut month = end_month;
    for _ in 0..count {
        months.push(PeriodKey {
            year,
            month: Some(month),
        });
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
