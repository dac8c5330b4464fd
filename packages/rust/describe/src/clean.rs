//! Post-processing of raw model output into a commit message.

use std::sync::LazyLock;

use regex::Regex;

/// `<think>...</think>` blocks emitted by reasoning models.
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// A whole reply wrapped in a fenced code block.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\n(.*?)\n?```$").expect("valid regex"));

/// Reduce a model reply to the message text.
///
/// Drops reasoning blocks, trims, then removes a single layer of wrapping
/// code fence or matching quotes. Returns an empty string when nothing
/// usable is left.
pub fn clean_message(raw: &str) -> String {
    let without_thinking = THINK_BLOCK.replace_all(raw, "");
    let mut text = without_thinking.trim();

    if let Some(caps) = CODE_FENCE.captures(text) {
        if let Some(inner) = caps.get(1) {
            text = inner.as_str().trim();
        }
    }

    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    text.to_string()
}
