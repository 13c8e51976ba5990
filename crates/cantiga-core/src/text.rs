//! Text normalization and tokenization.
//!
//! Local audio tags are noisy: stray punctuation, doubled spaces,
//! decorations like `"Midnight  City!"`. The remote catalog search is
//! keyword-based, so both query reformulation and candidate scoring work
//! on a normalized view of the text rather than the raw tag value.

use std::collections::HashSet;

/// Strip special characters and collapse whitespace.
///
/// Keeps alphanumeric characters (of any script) and single spaces;
/// everything else is treated as a separator. Runs of separators
/// collapse to one space and the result is trimmed.
///
/// ```
/// use cantiga_core::text::normalize;
/// assert_eq!(normalize("Midnight  City!"), "Midnight City");
/// assert_eq!(normalize("  (feat. Dragonette)  "), "feat Dragonette");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Split a string into a lowercased token set.
///
/// Tokens are delimited by whitespace and punctuation; the result is a
/// set, so repeated words count once. Used for Jaccard scoring.
#[must_use]
pub fn tokenize(input: &str) -> HashSet<String> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
