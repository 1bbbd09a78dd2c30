// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix and millisecond precision.
///
/// Fixed-width output keeps lexicographic order equal to chronological order,
/// which the `createdAt`/`submittedAt` orderings rely on.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as stored in documents.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
