// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Kogoto integration tests.
//!
//! Provides fake adapters and a harness so relay tests run without LINE,
//! Dify, or a persistent database.
//!
//! # Components
//!
//! - [`MockClassifier`] / [`MockComposer`] - queued classification results and fixed compositions
//! - [`MockTransport`] - captured replies and pushes with failure injection
//! - [`MemoryStorage`] - in-memory store with failure injection
//! - [`TestHarness`] - relay components over temp SQLite

pub mod harness;
pub mod memory_storage;
pub mod mock_provider;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_storage::MemoryStorage;
pub use mock_provider::{ComposeGate, MockClassifier, MockComposer};
pub use mock_transport::MockTransport;
