// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Kogoto.
//!
//! Receives LINE webhooks for both channels, exposes the bearer-protected
//! admin API, and serves health and Prometheus metrics.

pub mod auth;
pub mod handlers;
pub mod response;
pub mod server;
pub mod webhooks;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
