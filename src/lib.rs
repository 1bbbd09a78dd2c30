// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Calple: a shared organizer for couples.
//!
//! This crate provides the backend API: Google sign-in, partner pairing,
//! shared calendar events, cycle tracking, check-ins, map pins and an idea
//! board, all stored in Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::FirestoreDb;
use services::{GoogleOAuthClient, PairingService, UploadSigner};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub pairing: PairingService,
    pub google_oauth: GoogleOAuthClient,
    pub uploads: UploadSigner,
}

impl AppState {
    /// Wire services around a configuration and database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        Self {
            pairing: PairingService::new(db.clone()),
            google_oauth: GoogleOAuthClient::new(&config),
            uploads: UploadSigner::new(config.r2.clone()),
            config,
            db,
        }
    }
}
