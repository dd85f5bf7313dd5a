// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the relay's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod classifier;
pub mod composer;
pub mod storage;
pub mod transport;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use classifier::ClassifierAdapter;
pub use composer::ComposerAdapter;
pub use storage::StorageAdapter;
pub use transport::TransportAdapter;
