// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Month-view event selection.
//!
//! The Firestore side fetches candidate events with coarse range filters;
//! the final month decision and de-duplication happen here so they can be
//! tested without a database.

use crate::error::AppError;
use crate::models::DDay;
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// The month a client is viewing, as compact date bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day of the month (YYYYMMDD)
    pub start: String,
    /// Last day of the month (YYYYMMDD)
    pub end: String,
    /// Two-digit month (MM)
    pub month: String,
}

impl MonthWindow {
    /// Parse a `view` parameter of the form `YYYYMM`.
    pub fn parse(view: &str) -> Result<Self, AppError> {
        let invalid = || AppError::BadRequest(format!("Invalid view '{}': expected YYYYMM", view));

        if view.len() != 6 || !view.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = view[..4].parse().map_err(|_| invalid())?;
        let month: u32 = view[4..].parse().map_err(|_| invalid())?;
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(invalid)?;

        Ok(Self {
            start: first.format("%Y%m%d").to_string(),
            end: last.format("%Y%m%d").to_string(),
            month: format!("{:02}", first.month()),
        })
    }

    /// Whether an event belongs in this month's view.
    ///
    /// Annual events recur and match on month alone. Other events are shown
    /// when they overlap the month; undated ones are always shown.
    pub fn contains(&self, event: &DDay) -> bool {
        if event.date.is_empty() {
            return true;
        }

        if event.is_annual {
            return event.date.get(4..6) == Some(self.month.as_str());
        }

        let last_day = if event.end_date.is_empty() {
            &event.date
        } else {
            &event.end_date
        };

        event.date.as_str() <= self.end.as_str() && last_day.as_str() >= self.start.as_str()
    }
}

/// Merge query batches into the month view: de-duplicate by id, keep the
/// events the window contains, and order by date then title.
pub fn merge_month_view(batches: Vec<Vec<DDay>>, window: &MonthWindow) -> Vec<DDay> {
    let mut seen = HashSet::new();
    let mut events: Vec<DDay> = batches
        .into_iter()
        .flatten()
        .filter(|event| seen.insert(event.id.clone()))
        .filter(|event| window.contains(event))
        .collect();

    events.sort_by(|a, b| {
        display_day(a, window)
            .cmp(&display_day(b, window))
            .then_with(|| a.title.cmp(&b.title))
    });
    events
}

/// Sort key: annual events sort by their day within the viewed month.
fn display_day<'a>(event: &'a DDay, window: &MonthWindow) -> std::borrow::Cow<'a, str> {
    if event.is_annual && event.date.len() == 8 {
        std::borrow::Cow::Owned(format!("{}{}", &window.start[..6], &event.date[6..]))
    } else {
        std::borrow::Cow::Borrowed(event.date.as_str())
    }
}
