//! Asset key sanitizing.
//!
//! Turns a client-supplied filename into a key the repository accepts.
//! The rule is idempotent: a sanitized key passes through unchanged.

use std::sync::LazyLock;

use assetdav_types::AssetKindTag;
use regex::Regex;

use super::error::{DavError, DavResult};

/// Longest key, in characters.
pub const MAX_KEY_LEN: usize = 255;

/// Characters that are reserved in URLs or forbidden by Windows filesystems.
static RESERVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[#?*:\\<>|"%&@=;+]"#).expect("reserved-char pattern is valid"));

/// Sanitize `raw` into a valid asset key.
///
/// Code points outside the basic multilingual plane, `/` and reserved
/// characters become `-`, `~` becomes `---`, and leading or trailing
/// whitespace and dots are trimmed (no hidden files, no names Windows would
/// silently shorten). Keys longer than [`MAX_KEY_LEN`] are cut; files keep
/// their extension when it fits.
pub fn valid_key(raw: &str, kind: AssetKindTag) -> DavResult<String> {
    let trimmed = trim_key(raw);

    let mapped: String = trimmed
        .chars()
        .map(|c| if c as u32 > 0xFFFF || c == '/' { '-' } else { c })
        .collect();
    let mapped = RESERVED.replace_all(&mapped, "-").replace('~', "---");

    let key = truncate_key(&mapped, kind);
    let key = trim_key(&key);

    if key.is_empty() {
        return Err(DavError::validation(format!("{raw:?} has no valid characters")));
    }
    Ok(key.to_string())
}

fn trim_key(key: &str) -> &str {
    key.trim_matches(|c: char| c.is_whitespace() || c == '.')
}

fn truncate_key(key: &str, kind: AssetKindTag) -> String {
    if key.chars().count() <= MAX_KEY_LEN {
        return key.to_string();
    }

    if kind == AssetKindTag::File
        && let Some((stem, ext)) = key.rsplit_once('.')
    {
        let ext_len = ext.chars().count() + 1;
        if !stem.is_empty() && ext_len < MAX_KEY_LEN {
            let stem: String = stem.chars().take(MAX_KEY_LEN - ext_len).collect();
            return format!("{stem}.{ext}");
        }
    }

    key.chars().take(MAX_KEY_LEN).collect()
}
