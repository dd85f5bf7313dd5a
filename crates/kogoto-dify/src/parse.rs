// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpretation of free-text Dify answers.

use std::str::FromStr;
use std::sync::LazyLock;

use kogoto_core::{Sentiment, SentimentResult};
use regex::Regex;

use crate::types::ClassificationAnswer;

const FALLBACK_SUMMARY_CHARS: usize = 100;
const KEYWORD_SCORE: f64 = 0.8;
const NEUTRAL_SCORE: f64 = 0.5;

static SUMMARY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)summary:([^\n]*)").expect("summary pattern is valid"));

/// Turn a classifier answer into a [`SentimentResult`].
///
/// A JSON object `{"sentiment", "score", "summary"}` anywhere in the answer
/// (fenced or not) wins. Otherwise sentiment falls back to keyword spotting
/// and the summary to a `summary:` line or a prefix of the answer.
pub fn parse_classification(answer: &str) -> SentimentResult {
    if let Some(result) = parse_json_answer(answer) {
        return result;
    }

    let (sentiment, score) = keyword_sentiment(answer);
    SentimentResult {
        sentiment,
        score,
        summary: extract_summary(answer),
    }
}

fn parse_json_answer(answer: &str) -> Option<SentimentResult> {
    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: ClassificationAnswer = serde_json::from_str(&answer[start..=end]).ok()?;
    let sentiment = Sentiment::from_str(parsed.sentiment.trim()).ok()?;
    if !parsed.score.is_finite() {
        return None;
    }
    let summary = parsed
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| extract_summary(answer));
    Some(SentimentResult {
        sentiment,
        score: parsed.score.clamp(0.0, 1.0),
        summary,
    })
}

fn keyword_sentiment(answer: &str) -> (Sentiment, f64) {
    let lower = answer.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["positive", "happy", "good"]) {
        (Sentiment::Positive, KEYWORD_SCORE)
    } else if has(&["negative", "sad", "angry"]) {
        (Sentiment::Negative, KEYWORD_SCORE)
    } else {
        (Sentiment::Neutral, NEUTRAL_SCORE)
    }
}

fn extract_summary(answer: &str) -> String {
    if let Some(caps) = SUMMARY_LINE.captures(answer)
        && let Some(m) = caps.get(1)
    {
        let line = m.as_str().trim();
        if !line.is_empty() {
            return line.to_string();
        }
    }

    let trimmed = answer.trim();
    let mut prefix: String = trimmed.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    if prefix.len() < trimmed.len() {
        prefix.push_str("...");
    }
    prefix
}

/// True when a care-message answer means "send nothing".
pub fn is_no_message(answer: &str) -> bool {
    let trimmed = answer.trim().trim_end_matches(['.', '!']);
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none")
}
