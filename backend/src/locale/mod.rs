//! Language packs for the UI, loaded once at startup.
//!
//! `en` and `es` ship inside the binary. Any `<lang>.json` in the configured
//! locales directory is layered on top, replacing a built-in pack with the
//! same code. Each file is a flat JSON object of key → text.

use common::model::locale::LanguagePack;
use include_dir::{include_dir, Dir};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

static EMBEDDED_LOCALES: Dir = include_dir!("$CARGO_MANIFEST_DIR/locales");

#[derive(Debug, Clone)]
pub struct Locales {
    packs: BTreeMap<String, LanguagePack>,
    default_lang: String,
}

impl Locales {
    /// Built-in packs overlaid with the packs found in `dir`, if it exists.
    pub fn load(dir: &Path, default_lang: &str) -> Self {
        let mut packs = BTreeMap::new();

        for file in EMBEDDED_LOCALES.files() {
            if let Some(lang) = lang_of(file.path()) {
                match parse_pack(&lang, file.contents()) {
                    Ok(pack) => {
                        packs.insert(lang, pack);
                    }
                    Err(e) => warn!("Skipping built-in locale {}: {}", lang, e),
                }
            }
        }

        if dir.is_dir() {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    for path in entries.filter_map(Result::ok).map(|e| e.path()) {
                        let Some(lang) = lang_of(&path) else { continue };
                        match fs::read(&path)
                            .map_err(|e| e.to_string())
                            .and_then(|bytes| parse_pack(&lang, &bytes).map_err(|e| e.to_string()))
                        {
                            Ok(pack) => {
                                packs.insert(lang, pack);
                            }
                            Err(e) => warn!("Skipping locale file {}: {}", path.display(), e),
                        }
                    }
                }
                Err(e) => warn!("Cannot read locales dir {}: {}", dir.display(), e),
            }
        }

        info!("Loaded {} language pack(s)", packs.len());
        Self {
            packs,
            default_lang: default_lang.to_lowercase(),
        }
    }

    /// Pack for `lang`. Tries the exact code, then its primary subtag
    /// (`es-MX` → `es`), then the default pack.
    pub fn get(&self, lang: &str) -> Option<&LanguagePack> {
        let lang = lang.to_lowercase();
        let primary = lang.split(['-', '_']).next().unwrap_or_default();
        self.packs
            .get(&lang)
            .or_else(|| self.packs.get(primary))
            .or_else(|| self.packs.get(&self.default_lang))
    }

    /// Codes of every loaded pack, sorted.
    pub fn languages(&self) -> Vec<String> {
        self.packs.keys().cloned().collect()
    }
}

fn lang_of(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
}

fn parse_pack(lang: &str, bytes: &[u8]) -> Result<LanguagePack, serde_json::Error> {
    let entries: BTreeMap<String, String> = serde_json::from_slice(bytes)?;
    Ok(LanguagePack {
        lang: lang.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_packs_are_available_without_a_directory() {
        let locales = Locales::load(Path::new("/nonexistent/locales"), "en");
        assert_eq!(locales.languages(), vec!["en", "es"]);
        assert_eq!(
            locales.get("es").unwrap().text("status.merging"),
            "Mezclando canales de audio..."
        );
    }

    #[test]
    fn region_and_unknown_codes_fall_back() {
        let locales = Locales::load(Path::new("/nonexistent/locales"), "en");
        assert_eq!(locales.get("es-MX").unwrap().lang, "es");
        assert_eq!(locales.get("ES_es").unwrap().lang, "es");
        assert_eq!(locales.get("ja").unwrap().lang, "en");
    }

    #[test]
    fn directory_packs_override_and_extend() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), r#"{"status.merging": "Mixing"}"#).unwrap();
        fs::write(dir.path().join("fr.json"), r#"{"status.merging": "Mixage"}"#).unwrap();
        fs::write(dir.path().join("de.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let locales = Locales::load(dir.path(), "en");
        assert_eq!(locales.languages(), vec!["en", "es", "fr"]);
        assert_eq!(locales.get("en").unwrap().text("status.merging"), "Mixing");
        assert_eq!(locales.get("fr").unwrap().text("status.merging"), "Mixage");
        // Broken file falls through to the default pack.
        assert_eq!(locales.get("de").unwrap().lang, "en");
    }

    #[test]
    fn missing_key_reads_as_the_key() {
        let locales = Locales::load(Path::new("/nonexistent/locales"), "en");
        assert_eq!(locales.get("en").unwrap().text("no.such.key"), "no.such.key");
    }
}
