//! Keyword screen applied to every piece of story text.
//!
//! This is a blunt case-insensitive substring match, nothing smarter:
//! "hateful" and "whatever" both contain "hate". Flagged text is replaced
//! wholesale, never edited.

/// Substrings that flag a piece of text.
pub const BLOCKED_KEYWORDS: [&str; 6] = [
    "violence",
    "explicit",
    "inappropriate",
    "offensive",
    "hate",
    "discrimination",
];

/// What flagged text is replaced with.
pub const SCREENED_REPLACEMENT: &str =
    "The story continues with an unexpected but appropriate turn of events.";

/// Returns `true` if `text` contains any blocked keyword, ignoring case.
pub fn is_flagged(text: &str) -> bool {
    let lower = text.to_lowercase();
    BLOCKED_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Returns `text` unchanged, or [`SCREENED_REPLACEMENT`] if it's flagged.
pub fn screen(text: &str) -> String {
    if is_flagged(text) {
        tracing::debug!("screened flagged story text");
        SCREENED_REPLACEMENT.to_owned()
    } else {
        text.to_owned()
    }
}
