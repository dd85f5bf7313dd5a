// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay core for Kogoto.
//!
//! Sender-side complaints enter through [`IntakeHandler`], are stored
//! unprocessed, and are later combined and pushed to the linked recipient by
//! [`DeliveryScheduler`]. Recipients tune delivery with the chat commands
//! handled by [`RecipientHandler`].

pub mod commands;
pub mod intake;
pub mod runner;
pub mod scheduler;
pub mod shutdown;

pub use commands::{Command, RecipientHandler, RecipientOutcome};
pub use intake::{IntakeHandler, IntakeOutcome};
pub use runner::spawn_scheduler;
pub use scheduler::{BatchReport, DeliveryScheduler, GroupOutcome, GroupReport};
pub use shutdown::install_signal_handler;
