// Keybridge Key Translation Table
// Fixes known toolkit/locale key naming bugs via an immutable triple-keyed map

use std::collections::HashMap;

/// Maps a `(symbolic-name, keyval, keycode)` triple to a canonical key name.
///
/// Entries are keyed by the full triple so a quirk entry never collides with
/// an unrelated key that happens to share a symbolic name. The table is
/// populated once at initialization and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct KeyTranslationTable {
    entries: HashMap<(String, i32, i32), String>,
}

impl KeyTranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-loaded with the known locale-specific toolkit bugs:
    /// the numeric-keypad decimal key reported as "period" on some layouts,
    /// and the fr-layout dead keys reported under their dead_* spellings.
    pub fn with_locale_overrides() -> Self {
        let mut table = Self::new();
        table.insert("period", 46, 110, "KP_Decimal");
        table.insert("dead_tilde", 65107, 50, "asciitilde");
        table.insert("dead_grave", 65104, 55, "grave");
        table
    }

    pub fn insert(&mut self, keyname: &str, keyval: i32, keycode: i32, canonical: &str) {
        self.entries.insert(
            (keyname.to_string(), keyval, keycode),
            canonical.to_string(),
        );
    }

    /// Canonical name for a key triple, or the input name unchanged when no
    /// translation exists.
    pub fn translate<'a>(&'a self, keyname: &'a str, keyval: i32, keycode: i32) -> &'a str {
        match self
            .entries
            .get(&(keyname.to_string(), keyval, keycode))
        {
            Some(canonical) => {
                log::debug!(
                    "translate({}, {}, {}) -> {}",
                    keyname,
                    keyval,
                    keycode,
                    canonical
                );
                canonical
            }
            None => keyname,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_override_hits() {
        let table = KeyTranslationTable::with_locale_overrides();
        assert_eq!(table.translate("period", 46, 110), "KP_Decimal");
        assert_eq!(table.translate("dead_tilde", 65107, 50), "asciitilde");
        assert_eq!(table.translate("dead_grave", 65104, 55), "grave");
    }

    #[test]
    fn test_miss_returns_input_unchanged() {
        let table = KeyTranslationTable::with_locale_overrides();
        assert_eq!(table.translate("a", 97, 65), "a");
        // Same name but a different native code must not be translated
        assert_eq!(table.translate("period", 46, 190), "period");
        assert_eq!(table.translate("period", 190, 110), "period");
    }

    #[test]
    fn test_custom_entry() {
        let mut table = KeyTranslationTable::new();
        assert!(table.is_empty());
        table.insert("odiaeresis", 246, 39, "semicolon");
        assert_eq!(table.len(), 1);
        assert_eq!(table.translate("odiaeresis", 246, 39), "semicolon");
    }
}
