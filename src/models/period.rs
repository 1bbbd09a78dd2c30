// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Period tracking: per-day entries and cycle settings.

use serde::{Deserialize, Serialize};

/// `users/{uid}/periodDays/{date}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDay {
    /// YYYY-MM-DD, also the document ID
    pub date: String,
    #[serde(default)]
    pub is_period: bool,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub cramp_intensity: i64,
    #[serde(default)]
    pub mood: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub sex_activity: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// `users/{uid}/cycleSettings/default`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSettings {
    pub cycle_length: i64,
    pub period_length: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl CycleSettings {
    pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
    pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
    pub const CYCLE_LENGTH_RANGE: (i64, i64) = (20, 45);
    pub const PERIOD_LENGTH_RANGE: (i64, i64) = (1, 10);
}

impl Default for CycleSettings {
    /// Returned when a user has never saved settings; not persisted.
    fn default() -> Self {
        Self {
            cycle_length: Self::DEFAULT_CYCLE_LENGTH,
            period_length: Self::DEFAULT_PERIOD_LENGTH,
            created_at: None,
            updated_at: None,
        }
    }
}
