// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport trait for the chat platform.

use async_trait::async_trait;

use crate::error::KogotoError;
use crate::traits::adapter::PluginAdapter;

/// Outbound primitives of one chat-platform channel.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    /// Replies to an inbound event. A reply token is single-use.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), KogotoError>;

    /// Pushes a message to a user outside of any reply context.
    async fn push(&self, to: &str, text: &str) -> Result<(), KogotoError>;
}
