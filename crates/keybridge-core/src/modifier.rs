// Keybridge Modifier System
// Canonical modifier tokens and the keymap-derived token/key associations

use indexmap::IndexMap;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Canonical modifier token vocabulary.
///
/// The first eight tokens correspond to the X11-style modifier bits; the
/// semantic aliases (super/hyper/meta) are reported by some toolkits as
/// separate high mask bits and folded into the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Modifier {
    Shift,
    Lock,
    Control,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
    Super,
    Hyper,
    Meta,
}

impl Modifier {
    /// Bit used for order-independent set comparison.
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Fold a modifier list into a comparison bitset.
    pub fn bits(mods: &[Modifier]) -> u16 {
        mods.iter().fold(0, |acc, m| acc | m.bit())
    }
}

/// Native modifier key names mapped to canonical tokens.
///
/// Built once per keymap change from the toolkit's modifier mappings
/// (e.g. `control -> [Control_L, Control_R]`) and replaced wholesale on
/// every keymap/layout change notification, never mutated in place while
/// events are being resolved.
#[derive(Debug, Clone, Default)]
pub struct ModifierMap {
    keys_by_modifier: IndexMap<Modifier, Vec<String>>,
    modifier_by_key: HashMap<String, Modifier>,
}

impl ModifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(token, key names)` pairs as delivered by the toolkit's
    /// keymap query. Later entries for the same token extend the key list.
    pub fn from_mappings<I, S>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (Modifier, Vec<S>)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (modifier, keys) in mappings {
            for key in keys {
                map.insert(modifier, key.into());
            }
        }
        map
    }

    /// A typical pc105 mapping, useful as a fallback and in tests.
    pub fn pc105() -> Self {
        Self::from_mappings([
            (Modifier::Shift, vec!["Shift_L", "Shift_R"]),
            (Modifier::Lock, vec!["Caps_Lock"]),
            (Modifier::Control, vec!["Control_L", "Control_R"]),
            (Modifier::Mod1, vec!["Alt_L", "Alt_R", "Meta_L"]),
            (Modifier::Mod2, vec!["Num_Lock"]),
            (Modifier::Mod4, vec!["Super_L", "Super_R", "Hyper_L"]),
            (Modifier::Mod5, vec!["ISO_Level3_Shift"]),
        ])
    }

    pub fn insert(&mut self, modifier: Modifier, keyname: String) {
        self.modifier_by_key.insert(keyname.clone(), modifier);
        self.keys_by_modifier
            .entry(modifier)
            .or_default()
            .push(keyname);
    }

    pub fn is_empty(&self) -> bool {
        self.keys_by_modifier.is_empty()
    }

    /// Canonical token a native modifier key name is bound to.
    pub fn modifier_for_key(&self, keyname: &str) -> Option<Modifier> {
        self.modifier_by_key.get(keyname).copied()
    }

    /// Native key names bound to a token.
    pub fn keys_for(&self, modifier: Modifier) -> &[String] {
        self.keys_by_modifier
            .get(&modifier)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Token bound to the NumLock key on this layout, if any.
    pub fn numlock_modifier(&self) -> Option<Modifier> {
        self.modifier_for_key("Num_Lock")
    }

    /// Token bound to the AltGr role on this layout, if any.
    ///
    /// ISO_Level3_Shift is preferred, Mode_switch is the legacy spelling.
    pub fn altgr_modifier(&self) -> Option<Modifier> {
        for name in ["ISO_Level3_Shift", "Mode_switch"] {
            if let Some(modifier) = self.modifier_for_key(name) {
                return Some(modifier);
            }
        }
        None
    }

    /// All tokens that have at least one key bound, in insertion order.
    pub fn bound_modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.keys_by_modifier.keys().copied()
    }
}

/// All tokens in canonical resolution order.
pub fn canonical_order() -> impl Iterator<Item = Modifier> {
    Modifier::iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_modifier_display_round_trip() {
        assert_eq!(Modifier::Shift.to_string(), "shift");
        assert_eq!(Modifier::Mod5.to_string(), "mod5");
        assert_eq!(Modifier::from_str("control").unwrap(), Modifier::Control);
        assert_eq!(Modifier::from_str("MOD1").unwrap(), Modifier::Mod1);
        assert!(Modifier::from_str("bogus").is_err());
    }

    #[test]
    fn test_modifier_bits_order_independent() {
        let a = [Modifier::Shift, Modifier::Control];
        let b = [Modifier::Control, Modifier::Shift];
        assert_eq!(Modifier::bits(&a), Modifier::bits(&b));
        assert_ne!(
            Modifier::bits(&a),
            Modifier::bits(&[Modifier::Shift, Modifier::Control, Modifier::Mod1])
        );
    }

    #[test]
    fn test_modifier_map_roles() {
        let map = ModifierMap::pc105();
        assert_eq!(map.modifier_for_key("Control_R"), Some(Modifier::Control));
        assert_eq!(map.numlock_modifier(), Some(Modifier::Mod2));
        assert_eq!(map.altgr_modifier(), Some(Modifier::Mod5));
        assert_eq!(map.keys_for(Modifier::Control), &["Control_L", "Control_R"]);
    }

    #[test]
    fn test_modifier_map_mode_switch_fallback() {
        let map = ModifierMap::from_mappings([(Modifier::Mod5, vec!["Mode_switch"])]);
        assert_eq!(map.altgr_modifier(), Some(Modifier::Mod5));
    }

    #[test]
    fn test_modifier_map_missing_roles() {
        let map = ModifierMap::from_mappings([(Modifier::Control, vec!["Control_L"])]);
        assert_eq!(map.numlock_modifier(), None);
        assert_eq!(map.altgr_modifier(), None);
        assert!(map.keys_for(Modifier::Mod5).is_empty());
    }
}
