// Keybridge Null Platform
// Headless fallback: every query fails, every feature degrades

use super::{PlatformKeyboard, VirtualKey};

/// Platform backend for headless operation or unsupported targets.
///
/// All state queries answer `None`, so the quirk hooks that depend on them
/// become no-ops and events pass through otherwise unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlatform;

impl PlatformKeyboard for NullPlatform {
    fn key_down(&self, _key: VirtualKey) -> Option<bool> {
        None
    }

    fn key_toggled(&self, _key: VirtualKey) -> Option<bool> {
        None
    }

    fn raw_keyboard_repeat(&self) -> Option<(i32, i32)> {
        None
    }

    fn layout_handles(&self) -> Vec<u32> {
        Vec::new()
    }

    fn active_layout(&self) -> Option<u32> {
        None
    }

    fn layout_name(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_platform_answers_nothing() {
        let p = NullPlatform;
        assert_eq!(p.key_down(VirtualKey::RightAlt), None);
        assert_eq!(p.key_toggled(VirtualKey::NumLock), None);
        assert!(!p.swap_keys());
        assert_eq!(p.raw_keyboard_repeat(), None);
        assert!(p.layout_handles().is_empty());
        assert_eq!(p.layout_name(), None);
    }
}
