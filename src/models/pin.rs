// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map pins.

use serde::{Deserialize, Serialize};

/// `users/{uid}/pins/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// YYYY-MM-DD
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}
