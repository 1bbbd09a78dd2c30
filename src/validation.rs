// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strict parsers for the date formats and identifiers accepted by the API.
//!
//! Two date shapes exist: extended ISO 8601 (`YYYY-MM-DD`) for per-day
//! records and basic ISO 8601 (`YYYYMMDD`) for D-Day events, whose compact
//! form sorts and range-queries cleanly in Firestore. Anything else is
//! rejected, including unpadded fields and impossible calendar dates.

use crate::error::AppError;
use chrono::NaiveDate;

/// Parse an extended ISO date (`YYYY-MM-DD`).
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, AppError> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shape_ok {
        return Err(AppError::BadRequest(format!(
            "Invalid date '{}': expected YYYY-MM-DD",
            value
        )));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid calendar date '{}'", value)))
}

/// Parse a basic ISO date (`YYYYMMDD`).
pub fn parse_compact_date(value: &str) -> Result<NaiveDate, AppError> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Invalid date '{}': expected YYYYMMDD",
            value
        )));
    }

    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid calendar date '{}'", value)))
}

/// Format a date in the compact event form.
pub fn to_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Trim and lowercase an email address. Format checks happen on the request DTO.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject empty or whitespace-only required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_accepts_valid() {
        let date = parse_iso_date("2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_iso_date_rejects_non_iso() {
        for input in [
            "",
            "2024-1-05",
            "2024-01-5",
            "2024/01/05",
            "01/05/2024",
            "05-01-2024",
            "20240105",
            " 2024-01-05",
            "2024-01-05 ",
            "2024-01-05T00:00:00Z",
            "2024-13-01",
            "2023-02-29",
            "2024-04-31",
            "+024-01-05",
            "２０２４-01-05",
        ] {
            assert!(parse_iso_date(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_compact_date_accepts_valid() {
        let date = parse_compact_date("20241231").unwrap();
        assert_eq!(to_compact_date(date), "20241231");
    }

    #[test]
    fn test_compact_date_rejects_non_iso() {
        for input in [
            "", "2024-12-31", "2024123", "202412311", "20241332", "20240230", "2024120a",
            "12312024",
        ] {
            assert!(parse_compact_date(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Dinner").is_ok());
        assert!(require_text("title", "   ").is_err());
    }
}
