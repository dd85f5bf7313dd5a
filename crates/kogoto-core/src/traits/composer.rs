// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message composer trait.

use async_trait::async_trait;

use crate::error::KogotoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ComplaintRecord;

/// Turns complaint records into outbound text.
#[async_trait]
pub trait ComposerAdapter: PluginAdapter {
    /// Synthesizes one message for the recipient from a sender's pending complaints.
    async fn compose_for_recipient(
        &self,
        complaints: &[ComplaintRecord],
    ) -> Result<String, KogotoError>;

    /// Produces an optional comforting message for the sender.
    ///
    /// `Ok(None)` means the composer decided no message is warranted.
    async fn compose_care_message(
        &self,
        recent: &[ComplaintRecord],
    ) -> Result<Option<String>, KogotoError>;
}
