// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Idea board posts, roulette entries and feedback.

use serde::{Deserialize, Serialize};

/// `ideas/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Display name of the author
    pub author: String,
    /// Owner; only the author may edit or delete
    pub author_uid: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// `roulette/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouletteIdea {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// `users/{uid}/feedback/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub feedback_text: String,
    pub category: String,
    #[serde(default)]
    pub admin_comment: Option<String>,
    pub submitted_at: String,
}
