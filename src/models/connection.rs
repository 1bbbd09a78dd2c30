// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pairing documents, mirrored under both users with a shared id.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    Initiator,
    Receiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Active,
}

impl ConnectionStatus {
    /// Stored string form, for query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Active => "active",
        }
    }
}

/// `users/{uid}/connections/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub partner_email: String,
    /// Set on both sides when the connection becomes active
    #[serde(default)]
    pub partner_uid: Option<String>,
    pub role: ConnectionRole,
    pub status: ConnectionStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Connection {
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }
}
