//! Reference-date sources for week-scoped queries.

use std::str::FromStr;

use chrono::{Local, NaiveDate};

use crate::error::LisError;

/// Format of the reference date override.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Supplies the date the schedule is built for.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for FixedClock {
    type Err = LisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(FixedClock)
            .map_err(|_| LisError::InvalidDateFormat {
                value: s.to_string(),
            })
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Builds the clock for an optional `YYYY-MM-DD` override.
pub fn clock_for(as_of: Option<&str>) -> Result<Box<dyn Clock>, LisError> {
    match as_of {
        Some(value) => Ok(Box::new(value.parse::<FixedClock>()?)),
        None => Ok(Box::new(SystemClock)),
    }
}
