// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FanOutReport, FirestoreDb, VisibilityChange};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Subcollection of `users/{uid}`, mirrored on both sides of a pairing
    pub const CONNECTIONS: &str = "connections";
    pub const DDAYS: &str = "ddays";
    pub const PERIOD_DAYS: &str = "periodDays";
    pub const CYCLE_SETTINGS: &str = "cycleSettings";
    pub const CHECKINS: &str = "checkins";
    pub const PINS: &str = "pins";
    pub const FEEDBACK: &str = "feedback";
    pub const IDEAS: &str = "ideas";
    pub const ROULETTE: &str = "roulette";
    /// Probed by the connectivity health check; never written
    pub const HEALTH_CHECK: &str = "_health_check";
}

/// Document id of the single cycle-settings document per user.
pub const CYCLE_SETTINGS_DOC: &str = "default";
