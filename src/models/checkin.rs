// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily mood check-ins.

use serde::{Deserialize, Serialize};

/// `users/{uid}/checkins/{date}`, at most one per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    /// YYYY-MM-DD, also the document ID
    pub date: String,
    pub mood: String,
    pub energy: String,
    #[serde(default)]
    pub period_status: Option<String>,
    #[serde(default)]
    pub sexual_mood: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
