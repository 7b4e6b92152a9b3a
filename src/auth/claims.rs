// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated consumer they carry.

use serde::{Deserialize, Serialize};

/// The authenticated principal behind a request.
///
/// The zero value (`id == 0`, no grants) is what handlers observe when no
/// consumer was stored for the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    /// Consumer identifier
    pub id: i64,

    /// Permission names granted to the consumer, in issue order
    #[serde(default)]
    pub grants: Vec<String>,
}

impl Consumer {
    /// Check whether the consumer holds the named grant.
    pub fn has_grant(&self, grant: &str) -> bool {
        self.grants.iter().any(|g| g == grant)
    }
}

/// Claims carried by a consumer token.
///
/// Timestamps are Unix seconds. `exp` is mandatory; `iat` and `nbf` are only
/// checked when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Expires at
    pub exp: i64,

    pub consumer: Consumer,
}

impl Claims {
    /// True when the token claims to have been issued after `now`.
    pub fn issued_after(&self, now: i64) -> bool {
        self.iat.is_some_and(|iat| iat > now)
    }
}
