// Keybridge Platform Boundary
// Live OS keyboard-state queries behind a single trait, one variant per OS

mod mock;
mod null;

pub use mock::MockPlatform;
pub use null::NullPlatform;

/// Virtual keys the pipeline queries live state for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    RightAlt,
    NumLock,
    CapsLock,
}

/// OS-level keyboard queries used by the normalization pipeline.
///
/// One implementation per target platform is selected at startup. Every
/// query is best-effort: `None` means the platform could not answer, and
/// callers must degrade to the conservative default (key not active,
/// unknown layout) rather than fail. Queries are expected to be fast,
/// non-blocking syscalls; none of them may stall event delivery.
pub trait PlatformKeyboard {
    /// Is the named key physically held down right now?
    fn key_down(&self, key: VirtualKey) -> Option<bool>;

    /// Is the named lock key currently latched on?
    fn key_toggled(&self, key: VirtualKey) -> Option<bool>;

    /// Platform convention of swapping the control and meta tokens.
    fn swap_keys(&self) -> bool {
        false
    }

    /// Raw keyboard repeat (delay, speed) parameters, platform units.
    fn raw_keyboard_repeat(&self) -> Option<(i32, i32)>;

    /// All installed keyboard layout handles.
    fn layout_handles(&self) -> Vec<u32>;

    /// Handle of the layout active for the foreground thread.
    fn active_layout(&self) -> Option<u32>;

    /// Hex identifier string of the active layout (e.g. "00000409").
    fn layout_name(&self) -> Option<String>;
}

impl<P: PlatformKeyboard + ?Sized> PlatformKeyboard for Box<P> {
    fn key_down(&self, key: VirtualKey) -> Option<bool> {
        (**self).key_down(key)
    }

    fn key_toggled(&self, key: VirtualKey) -> Option<bool> {
        (**self).key_toggled(key)
    }

    fn swap_keys(&self) -> bool {
        (**self).swap_keys()
    }

    fn raw_keyboard_repeat(&self) -> Option<(i32, i32)> {
        (**self).raw_keyboard_repeat()
    }

    fn layout_handles(&self) -> Vec<u32> {
        (**self).layout_handles()
    }

    fn active_layout(&self) -> Option<u32> {
        (**self).active_layout()
    }

    fn layout_name(&self) -> Option<String> {
        (**self).layout_name()
    }
}
