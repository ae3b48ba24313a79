// Keybridge Core Library
// Client-side keyboard normalization for remote-display sessions

pub mod altgr;
pub mod event;
pub mod keyboard;
pub mod layout;
pub mod mask;
pub mod modifier;
pub mod platform;
pub mod settings;
pub mod shortcut;
pub mod translate;

pub use altgr::{AltGrDisambiguator, DEFAULT_CONTROL_KEY_DELAY_MS};
pub use event::{KeyEvent, HYPER_KEYCODE, HYPER_KEYVAL, VOID_KEYVAL};
pub use keyboard::Keyboard;
pub use layout::{get_keyboard_repeat, get_layout_spec, layout_for_handle, LayoutSpec};
pub use mask::{
    MaskResolver, ModifierSet, CONTROL_MASK, HYPER_MASK, LOCK_MASK, META_MASK, MOD1_MASK,
    MOD2_MASK, MOD3_MASK, MOD4_MASK, MOD5_MASK, SHIFT_MASK, SUPER_MASK,
};
pub use modifier::{Modifier, ModifierMap};
pub use platform::{MockPlatform, NullPlatform, PlatformKeyboard, VirtualKey};
pub use settings::Settings;
pub use shortcut::{
    parse_shortcut_spec, ShortcutBinding, ShortcutModifier, ShortcutParseError, ShortcutTable,
};
pub use translate::KeyTranslationTable;
