// Keybridge Shortcut Table
// Parses "MOD+MOD+...+KEY:action" specs and matches them against live state

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::modifier::Modifier;

/// A modifier slot in a binding: a fixed token, or the `#` wildcard standing
/// for the platform's primary shortcut modifier, resolved at match time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutModifier {
    Fixed(Modifier),
    Primary,
}

/// One parsed shortcut binding. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutBinding {
    pub modifiers: SmallVec<[ShortcutModifier; 4]>,
    pub keyname: String,
    pub action: String,
}

/// Errors for individual shortcut specs. A malformed entry is skipped and
/// reported; it never aborts the rest of the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShortcutParseError {
    #[error("shortcut spec '{0}' has no ':action' part")]
    MissingAction(String),
    #[error("shortcut spec '{0}' has an empty key name")]
    EmptyKeyName(String),
    #[error("shortcut spec '{spec}' uses unknown modifier '{token}'")]
    UnknownModifier { spec: String, token: String },
}

/// Parse a single spec string into a binding.
///
/// The spec splits on the last `:`; the left side splits on `+`, with the
/// final token as the key name and everything before it as case-insensitive
/// modifier names. `#` is kept symbolic and resolved when matching.
pub fn parse_shortcut_spec(spec: &str) -> Result<ShortcutBinding, ShortcutParseError> {
    let (left, action) = spec
        .rsplit_once(':')
        .ok_or_else(|| ShortcutParseError::MissingAction(spec.to_string()))?;
    let action = action.trim();
    if action.is_empty() {
        return Err(ShortcutParseError::MissingAction(spec.to_string()));
    }

    let mut tokens: Vec<&str> = left.split('+').map(str::trim).collect();
    let keyname = tokens.pop().unwrap_or("");
    if keyname.is_empty() {
        return Err(ShortcutParseError::EmptyKeyName(spec.to_string()));
    }

    let mut modifiers: SmallVec<[ShortcutModifier; 4]> = SmallVec::new();
    for token in tokens {
        let modifier = parse_modifier_token(token).ok_or_else(|| {
            ShortcutParseError::UnknownModifier {
                spec: spec.to_string(),
                token: token.to_string(),
            }
        })?;
        if !modifiers.contains(&modifier) {
            modifiers.push(modifier);
        }
    }

    Ok(ShortcutBinding {
        modifiers,
        keyname: keyname.to_string(),
        action: action.to_string(),
    })
}

/// Reserved modifier vocabulary for shortcut specs.
fn parse_modifier_token(token: &str) -> Option<ShortcutModifier> {
    let modifier = match token.to_ascii_lowercase().as_str() {
        "#" => return Some(ShortcutModifier::Primary),
        "shift" => Modifier::Shift,
        "lock" => Modifier::Lock,
        "control" | "ctrl" => Modifier::Control,
        "alt" | "mod1" => Modifier::Mod1,
        "mod2" => Modifier::Mod2,
        "mod3" => Modifier::Mod3,
        "mod4" => Modifier::Mod4,
        "altgr" | "iso_level3_shift" | "mod5" => Modifier::Mod5,
        "super" => Modifier::Super,
        "hyper" => Modifier::Hyper,
        "meta" => Modifier::Meta,
        _ => return None,
    };
    Some(ShortcutModifier::Fixed(modifier))
}

/// The configured shortcut bindings for a session.
///
/// Bindings are parsed once and read-only afterwards; reconfiguration
/// replaces the whole table. The primary-modifier set backing the `#`
/// wildcard can change with the platform or layout and is consulted on
/// every match, never baked into the parsed bindings.
#[derive(Debug, Clone)]
pub struct ShortcutTable {
    bindings: Vec<ShortcutBinding>,
    primary: SmallVec<[Modifier; 2]>,
}

impl Default for ShortcutTable {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            primary: SmallVec::from_slice(&[Modifier::Mod1]),
        }
    }
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an ordered list of spec strings. Malformed entries are logged
    /// and skipped; parsing continues with the rest.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Self {
        let mut table = Self::new();
        for spec in specs {
            match parse_shortcut_spec(spec.as_ref()) {
                Ok(binding) => table.bindings.push(binding),
                Err(e) => log::warn!("ignoring shortcut: {}", e),
            }
        }
        log::debug!("parsed {} shortcut bindings", table.bindings.len());
        table
    }

    pub fn bindings(&self) -> &[ShortcutBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Replace the primary-shortcut modifier set the `#` wildcard resolves
    /// against. Called when the platform or layout changes.
    pub fn set_primary(&mut self, primary: &[Modifier]) {
        self.primary = SmallVec::from_slice(primary);
    }

    pub fn primary(&self) -> &[Modifier] {
        &self.primary
    }

    /// Union of all modifiers referenced by any binding, with `#` resolved
    /// against the current primary set. Callers use this to know which
    /// modifier keys must be tracked at all.
    pub fn distinct_modifiers(&self) -> IndexSet<Modifier> {
        let mut distinct = IndexSet::new();
        for binding in &self.bindings {
            for modifier in &binding.modifiers {
                match modifier {
                    ShortcutModifier::Fixed(m) => {
                        distinct.insert(*m);
                    }
                    ShortcutModifier::Primary => {
                        distinct.extend(self.primary.iter().copied());
                    }
                }
            }
        }
        distinct
    }

    fn required_bits(&self, binding: &ShortcutBinding) -> u16 {
        binding.modifiers.iter().fold(0, |acc, m| match m {
            ShortcutModifier::Fixed(m) => acc | m.bit(),
            ShortcutModifier::Primary => acc | Modifier::bits(&self.primary),
        })
    }

    /// Find the action bound to `(modifiers, keyname)`.
    ///
    /// Only press events trigger shortcuts. Modifier comparison is
    /// order-independent but exact: a binding requiring `{shift, control}`
    /// does not match while a third modifier is also held.
    pub fn matches(&self, keyname: &str, modifiers: &[Modifier], pressed: bool) -> Option<&str> {
        if !pressed {
            return None;
        }
        let active_bits = Modifier::bits(modifiers);
        for binding in &self.bindings {
            if binding.keyname == keyname && self.required_bits(binding) == active_bits {
                log::debug!(
                    "shortcut {}+{} -> {}",
                    binding
                        .modifiers
                        .iter()
                        .map(|m| format!("{:?}", m))
                        .collect::<Vec<_>>()
                        .join("+"),
                    keyname,
                    binding.action
                );
                return Some(&binding.action);
            }
        }
        None
    }
}
