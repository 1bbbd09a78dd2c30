// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod checkin;
pub mod connection;
pub mod dday;
pub mod idea;
pub mod period;
pub mod pin;
pub mod user;

pub use checkin::Checkin;
pub use connection::{Connection, ConnectionRole, ConnectionStatus};
pub use dday::DDay;
pub use idea::{Feedback, Idea, RouletteIdea};
pub use period::{CycleSettings, PeriodDay};
pub use pin::Pin;
pub use user::{OAuthTokens, Sex, User, UserProfile};
