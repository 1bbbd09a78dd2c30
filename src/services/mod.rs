// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod google_oauth;
pub mod pairing;
pub mod upload;

pub use calendar::{merge_month_view, MonthWindow};
pub use google_oauth::{GoogleOAuthClient, GoogleUserInfo, TokenResponse};
pub use pairing::{AcceptOutcome, PairingService, PendingInvitation};
pub use upload::{PresignedUpload, UploadSigner};
