// Keybridge Key Event
// Portable key event model passed through the normalization pipeline

use smallvec::SmallVec;
use std::fmt;

use crate::Modifier;

/// Sentinel keyval reported by the toolkit for events with no usable symbol.
pub const VOID_KEYVAL: i32 = (1 << 24) - 1;

/// Keyval assigned to the synthetic Hyper_L key when the Hyper carrier
/// override relabels a Delete event.
pub const HYPER_KEYVAL: i32 = (1 << 24) - 1;

/// Native keycode assigned to the synthetic Hyper_L key.
pub const HYPER_KEYCODE: i32 = 50;

/// A single key event as it flows through the pipeline.
///
/// Created once per native event, mutated in place by the pipeline stages,
/// and either delivered downstream or discarded. Never shared across
/// concurrent consumers; the whole pipeline is single-threaded.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// Symbolic key name (e.g. "Control_L", "F4", "a")
    pub keyname: String,
    /// Symbolic key value reported by the toolkit
    pub keyval: i32,
    /// Native scancode
    pub keycode: i32,
    /// Keyboard group index
    pub group: i32,
    /// Canonical modifier tokens active for this event, in resolution order
    pub modifiers: SmallVec<[Modifier; 4]>,
    /// Press (true) or release (false)
    pub pressed: bool,
    /// Text produced by the key, empty if none
    pub string: String,
}

impl KeyEvent {
    pub fn new(keyname: &str, keyval: i32, keycode: i32, pressed: bool) -> Self {
        Self {
            keyname: keyname.to_string(),
            keyval,
            keycode,
            group: 0,
            modifiers: SmallVec::new(),
            pressed,
            string: String::new(),
        }
    }

    /// Check for the VoidSymbol placeholder the toolkit emits for events
    /// that carry no usable key identity. These are dropped outright.
    pub fn is_void(&self) -> bool {
        self.keyval == VOID_KEYVAL && self.keyname == "VoidSymbol"
    }

    /// Strip the key identity so the event only triggers a modifier-state
    /// refresh downstream, never a text insertion or key action.
    pub fn clear_identity(&mut self) {
        self.string.clear();
        self.keyname.clear();
        self.group = -1;
        self.keyval = -1;
        self.keycode = -1;
    }

    /// True once the identity has been cleared.
    pub fn is_modifier_refresh(&self) -> bool {
        self.keyname.is_empty() && self.keyval == -1 && self.keycode == -1
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeyEvent(keyname={}, keyval={}, keycode={}, group={}, modifiers={:?}, pressed={})",
            self.keyname, self.keyval, self.keycode, self.group, self.modifiers, self.pressed
        )
    }
}
