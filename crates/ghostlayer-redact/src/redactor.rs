//! Tag rendering and restoration
//!
//! Replacement tags (`[CATEGORY_N]`) are the only contract with whatever
//! rewrites the redacted text. Rendering substitutes them in; restoring swaps
//! them back out, leaving any bracketed text it does not recognize verbatim.

use ghostlayer_core::Match;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::debug;

/// Uppercase category, underscore, 1-based index, in square brackets
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[A-Z_]+_\d+\]").unwrap());

/// Replace every effectively redacted span with its tag
///
/// Matches whose span no longer lines up with `text`, or that overlap an
/// earlier rendered span, are left as plain text.
pub fn render_redacted(text: &str, matches: &[Match]) -> String {
    let mut ordered: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_effectively_redacted())
        .collect();
    ordered.sort_by_key(|m| m.start);

    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in ordered {
        let Some(tag) = m.replacement_tag.as_deref() else {
            continue;
        };
        if m.start < last_end {
            continue;
        }

        match (text.get(last_end..m.start), text.get(m.start..m.end)) {
            (Some(before), Some(original)) if original == m.text => {
                result.push_str(before);
                result.push_str(tag);
                last_end = m.end;
            }
            _ => debug!("Skipping stale match '{}' at {}..{}", m.text, m.start, m.end),
        }
    }

    result.push_str(&text[last_end..]);
    result
}

/// Tag to original text, for every redacted match carrying a tag
///
/// Matches sharing a tag are one entity; the first one seen wins.
pub fn tag_map(matches: &[Match]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for m in matches.iter().filter(|m| m.is_redacted) {
        if let Some(tag) = &m.replacement_tag {
            map.entry(tag.clone()).or_insert_with(|| m.text.clone());
        }
    }
    map
}

/// Replace every recognized tag in `tagged` with its original value
pub fn restore(tagged: &str, matches: &[Match]) -> String {
    restore_with(tagged, &tag_map(matches))
}

/// Restore against a prebuilt tag map
pub fn restore_with(tagged: &str, tags: &HashMap<String, String>) -> String {
    if tags.is_empty() {
        return tagged.to_string();
    }

    TAG_REGEX
        .replace_all(tagged, |caps: &Captures| {
            let tag = &caps[0];
            tags.get(tag).cloned().unwrap_or_else(|| tag.to_string())
        })
        .into_owned()
}

/// Every tag-shaped token in `text`, in order of appearance
pub fn find_tags(text: &str) -> Vec<&str> {
    TAG_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}
