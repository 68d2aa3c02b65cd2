//! Cleanup applied to model answers before they reach the chat

use once_cell::sync::Lazy;
use regex::Regex;

use larkbridge_core::FALLBACK_ANSWER;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block pattern"));

static AT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<at.*?</at>").expect("valid at-tag pattern"));

/// Strip reasoning blocks and `<at>` placeholders, then trim
///
/// Falls back to a fixed answer when nothing is left.
pub fn clean_reply(text: &str) -> String {
    let without_thinking = THINK_BLOCK.replace_all(text, "");
    let without_mentions = AT_TAG.replace_all(&without_thinking, "");
    let cleaned = without_mentions.trim();
    if cleaned.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        cleaned.to_string()
    }
}
