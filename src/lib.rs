// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Microservice Core - request authentication and schema migrations
//!
//! ## Modules
//!
//! - `auth` - Bearer-token middleware and the authenticated consumer
//! - `migrate` - CockroachDB migration runner and connection options
//! - `response` - JSON status/message/data envelope
//! - `api` - Service routes (health probes, consumer echo)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod migrate;
pub mod response;
pub mod state;
