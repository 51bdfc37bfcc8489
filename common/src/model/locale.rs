use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flat key → text table for one UI language.
///
/// Status labels are looked up with the key `status.<code>`, e.g.
/// `status.downloading_audio`.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct LanguagePack {
    /// ISO 639-1 code of the pack (`en`, `es`, ...).
    pub lang: String,
    pub entries: BTreeMap<String, String>,
}

impl LanguagePack {
    /// Returns the text for `key`, or the key itself when the pack lacks it.
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }
}
