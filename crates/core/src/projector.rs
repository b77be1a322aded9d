//! Month projection over the case collection.
//!
//! Dates in case records are free text. Anything that parses as `YYYY-MM-DD` takes part in
//! month matching and calendar flagging; anything else is skipped, so a record with a bad date
//! simply drops out of date-filtered views.
//!
//! All functions here are pure and recompute from the collection they are given.

use crate::constants::ISO_DATE_FORMAT;
use crate::{CaseError, CaseResult, CaseSchema};
use case_types::CaseRecord;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("expected a YYYY-MM-DD date, got {0:?}")]
    Format(String),
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(input.trim(), ISO_DATE_FORMAT)
        .map_err(|_| DateParseError::Format(input.to_string()))
}

fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// Parsed test dates of a record; unparseable entries are skipped.
fn test_dates<'a>(
    record: &'a CaseRecord,
    schema: &'a CaseSchema,
) -> impl Iterator<Item = NaiveDate> + 'a {
    record
        .items(schema.test_dates_field())
        .filter_map(|raw| parse_iso_date(raw).ok())
}

/// True when the record's primary date or any of its test dates falls in `(year, month)`.
pub fn matches_month(record: &CaseRecord, schema: &CaseSchema, year: i32, month: u32) -> bool {
    let primary = record
        .text(schema.date_field())
        .and_then(|raw| parse_iso_date(raw).ok())
        .is_some_and(|date| in_month(date, year, month));

    primary || test_dates(record, schema).any(|date| in_month(date, year, month))
}

/// Records that touch `(year, month)`, in collection order.
///
/// Lazy; each call walks the slice afresh.
pub fn month_records<'a>(
    collection: &'a [CaseRecord],
    schema: &'a CaseSchema,
    year: i32,
    month: u32,
) -> impl Iterator<Item = &'a CaseRecord> + 'a {
    collection
        .iter()
        .filter(move |record| matches_month(record, schema, year, month))
}

/// Distinct test dates inside `(year, month)` across the whole collection.
pub fn test_date_set(
    collection: &[CaseRecord],
    schema: &CaseSchema,
    year: i32,
    month: u32,
) -> BTreeSet<NaiveDate> {
    collection
        .iter()
        .flat_map(|record| test_dates(record, schema))
        .filter(|date| in_month(*date, year, month))
        .collect()
}

/// One cell of the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
    /// True when a test date falls on this day.
    pub flagged: bool,
}

/// Full-week rows covering one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    year: i32,
    month: u32,
    first_weekday: Weekday,
    weeks: Vec<[CalendarDay; 7]>,
}

impl CalendarGrid {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    pub fn weeks(&self) -> &[[CalendarDay; 7]] {
        &self.weeks
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flatten()
    }

    /// Column headings, starting at the grid's first weekday.
    pub fn weekday_headers(&self) -> [Weekday; 7] {
        let mut day = self.first_weekday;
        std::array::from_fn(|_| {
            let current = day;
            day = day.succ();
            current
        })
    }

    /// Flags every in-month cell whose date is in `dates`.
    ///
    /// Dates from other months never flag a cell, even where the grid shows that day.
    #[must_use]
    pub fn with_flags(mut self, dates: &BTreeSet<NaiveDate>) -> Self {
        for day in self.weeks.iter_mut().flatten() {
            day.flagged = day.in_month && dates.contains(&day.date);
        }
        self
    }
}

/// Builds the calendar for `(year, month)` with weeks starting on `first_weekday`.
///
/// No cell is flagged; see [`CalendarGrid::with_flags`].
///
/// # Errors
///
/// `CaseError::InvalidInput` if `(year, month)` is not a representable month.
pub fn build_calendar_grid(
    year: i32,
    month: u32,
    first_weekday: Weekday,
) -> CaseResult<CalendarGrid> {
    let invalid = || CaseError::InvalidInput(format!("invalid month: {year}-{month:02}"));

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    let lead = (7 + first.weekday().num_days_from_monday()
        - first_weekday.num_days_from_monday())
        % 7;
    let start = first
        .checked_sub_days(Days::new(u64::from(lead)))
        .ok_or_else(invalid)?;
    let rows = (lead + last.day()).div_ceil(7) as usize;

    let days: Vec<CalendarDay> = start
        .iter_days()
        .take(rows * 7)
        .map(|date| CalendarDay {
            date,
            in_month: in_month(date, year, month),
            flagged: false,
        })
        .collect();
    if days.len() != rows * 7 {
        return Err(invalid());
    }

    let weeks = days
        .chunks_exact(7)
        .map(|week| std::array::from_fn(|i| week[i]))
        .collect();

    Ok(CalendarGrid {
        year,
        month,
        first_weekday,
        weeks,
    })
}
