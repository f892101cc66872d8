// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only views of collaborator data: profiles and the connection graph.

use serde::{Deserialize, Serialize};

/// Minimal profile needed to label match results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID (also used as document ID)
    pub user_id: u64,
    pub username: String,
}

impl UserProfile {
    /// Label used when a user has no stored profile.
    pub fn fallback_username(user_id: u64) -> String {
        format!("user-{}", user_id)
    }
}

/// One direction of a connection edge. Both directions are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub user_id: u64,
    pub connected_user_id: u64,
}
