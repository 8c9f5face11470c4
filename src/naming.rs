//! Naming rules.
//! Pure string transforms that map a current name to its desired name.
//!
//! - Files: drop trailing " (n)" counters from the stem, lower-case the stem,
//!   upper-case its first character, keep the extension byte-for-byte.
//! - Folders: drop trailing " (n)" counters, then upper-case everything.
//!
//! Both rules are idempotent and never return an empty name.

use regex::Regex;
use std::sync::LazyLock;

/// One or more trailing " (digits)" groups, e.g. "photo (1)" or "photo (1) (2)".
static NUMBER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+\(\d+\))+$").expect("valid suffix regex"));

/// Remove trailing " (number)" counters from `text`.
pub fn clean_number_suffix(text: &str) -> &str {
    match NUMBER_SUFFIX.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// Split `name` into (stem, extension-with-dot).
///
/// The extension starts at the last '.', unless that dot is the first
/// character (".bashrc" has no extension).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Desired name for a file.
pub fn file_name_rule(name: &str) -> String {
    if name.is_empty() {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    if stem.is_empty() {
        return name.to_string();
    }

    let cleaned = clean_number_suffix(stem);
    if cleaned.is_empty() {
        return name.to_string();
    }

    let lowered = cleaned.to_lowercase();
    let mut chars = lowered.chars();
    let mut out = String::with_capacity(name.len());
    if let Some(first) = chars.next() {
        let mut upper = first.to_uppercase();
        // Multi-char expansions ("ß" -> "SS") would not survive a second pass.
        if upper.len() == 1 {
            out.extend(upper.next());
        } else {
            out.push(first);
        }
    }
    out.push_str(chars.as_str());
    out.push_str(ext);
    out
}

/// Desired name for a folder.
pub fn folder_name_rule(name: &str) -> String {
    if name.is_empty() {
        return name.to_string();
    }
    let cleaned = clean_number_suffix(name);
    if cleaned.is_empty() {
        return name.to_string();
    }
    cleaned.to_uppercase()
}
