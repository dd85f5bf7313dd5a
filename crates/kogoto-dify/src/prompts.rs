// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates sent to the composer app.

use std::fmt::Write;

use kogoto_core::ComplaintRecord;

/// Prompt asking for one message to the recipient covering every complaint.
pub fn recipient_prompt(complaints: &[ComplaintRecord]) -> String {
    let mut prompt = String::from("These are recent complaints from your partner:\n\n");
    for (i, c) in complaints.iter().enumerate() {
        let summary = c.summary.as_deref().unwrap_or("(no summary)");
        let _ = writeln!(prompt, "{}. {summary}\n   Original: \"{}\"\n", i + 1, c.original_text);
    }
    prompt.push_str(
        "Write a message to the recipient based on these complaints. \
         Acknowledge how the sender feels and gently suggest what the recipient \
         could do or keep in mind.",
    );
    prompt
}

/// Prompt asking for a comforting message to the sender, or `none`.
pub fn care_prompt(recent: &[ComplaintRecord]) -> String {
    let mut prompt = String::from("These are recent complaints:\n\n");
    for (i, c) in recent.iter().enumerate() {
        let _ = writeln!(prompt, "{}. \"{}\"", i + 1, c.original_text);
    }
    prompt.push_str(
        "\nThe writer seems stressed or frustrated. Write a short, caring message \
         to encourage them, with a concrete suggestion for rest or relief. \
         If no message is appropriate, answer with the single word none.",
    );
    prompt
}
