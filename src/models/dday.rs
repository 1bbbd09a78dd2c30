// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared calendar events ("D-Days").

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// `ddays/{id}`. Visible to `created_by` and every member of `connected_users`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DDay {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub description: String,
    /// Start date (YYYYMMDD), empty for undated events
    #[serde(default)]
    pub date: String,
    /// Last day (YYYYMMDD), empty for single-day events
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_annual: bool,
    /// Creator email
    pub created_by: String,
    #[serde(default)]
    pub connected_users: Vec<String>,
    #[serde(default = "default_editable")]
    pub editable: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn default_editable() -> bool {
    true
}

impl DDay {
    /// Title of the event maintained from `startedDating`.
    pub const ANNIVERSARY_TITLE: &'static str = "Anniversary";

    /// Visibility list for a new event: the active partner, if any.
    pub fn initial_visibility(partner_email: Option<&str>) -> Vec<String> {
        partner_email.map(|e| vec![e.to_string()]).unwrap_or_default()
    }

    /// Add `email` to the visibility list. Returns `true` if it changed.
    pub fn grant_visibility(&mut self, email: &str) -> bool {
        if self.connected_users.iter().any(|u| u == email) {
            return false;
        }
        self.connected_users.push(email.to_string());
        true
    }

    /// Remove every occurrence of `email`. Returns `true` if it changed.
    pub fn revoke_visibility(&mut self, email: &str) -> bool {
        let before = self.connected_users.len();
        self.connected_users.retain(|u| u != email);
        self.connected_users.len() != before
    }

    pub fn is_visible_to(&self, email: &str) -> bool {
        self.created_by == email || self.connected_users.iter().any(|u| u == email)
    }
}
