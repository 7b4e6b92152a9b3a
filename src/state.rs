// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }
}
