//! Tag string normalization
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashSet;

/// Separator used when joining tags back into a prompt string
pub const TAG_SEPARATOR: &str = ", ";

/// Normalize a comma-separated tag string.
///
/// Each segment is trimmed and lowercased, empty segments are dropped and
/// duplicates are removed keeping the first occurrence. The result is joined
/// with `", "`. Applying it twice yields the same string.
pub fn normalize(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for segment in text.split(',') {
        let tag = segment.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }

    tags.join(TAG_SEPARATOR)
}

/// Join the non-empty parts with `", "` without normalizing them
pub fn join_non_empty<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}
