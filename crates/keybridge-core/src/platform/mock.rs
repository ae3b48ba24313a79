// Keybridge Mock Platform
// Scripted platform state for the test suites

use std::cell::{Cell, RefCell};

use super::{PlatformKeyboard, VirtualKey};

/// Scripted platform backend.
///
/// State is held in interior-mutable cells so a test can flip key state
/// mid-scenario while the pipeline holds the platform by shared reference.
#[derive(Debug, Default)]
pub struct MockPlatform {
    right_alt_down: Cell<Option<bool>>,
    numlock_on: Cell<Option<bool>>,
    capslock_on: Cell<Option<bool>>,
    swap_keys: Cell<bool>,
    raw_repeat: Cell<Option<(i32, i32)>>,
    layouts: RefCell<Vec<u32>>,
    active: Cell<Option<u32>>,
    name: RefCell<Option<String>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_right_alt_down(&self, down: Option<bool>) {
        self.right_alt_down.set(down);
    }

    pub fn set_numlock(&self, on: Option<bool>) {
        self.numlock_on.set(on);
    }

    pub fn set_capslock(&self, on: Option<bool>) {
        self.capslock_on.set(on);
    }

    pub fn set_swap_keys(&self, swap: bool) {
        self.swap_keys.set(swap);
    }

    pub fn set_raw_repeat(&self, repeat: Option<(i32, i32)>) {
        self.raw_repeat.set(repeat);
    }

    pub fn set_layouts(&self, handles: Vec<u32>) {
        *self.layouts.borrow_mut() = handles;
    }

    pub fn set_active_layout(&self, handle: Option<u32>) {
        self.active.set(handle);
    }

    pub fn set_layout_name(&self, name: Option<&str>) {
        *self.name.borrow_mut() = name.map(|s| s.to_string());
    }
}

impl PlatformKeyboard for MockPlatform {
    fn key_down(&self, key: VirtualKey) -> Option<bool> {
        match key {
            VirtualKey::RightAlt => self.right_alt_down.get(),
            _ => None,
        }
    }

    fn key_toggled(&self, key: VirtualKey) -> Option<bool> {
        match key {
            VirtualKey::NumLock => self.numlock_on.get(),
            VirtualKey::CapsLock => self.capslock_on.get(),
            _ => None,
        }
    }

    fn swap_keys(&self) -> bool {
        self.swap_keys.get()
    }

    fn raw_keyboard_repeat(&self) -> Option<(i32, i32)> {
        self.raw_repeat.get()
    }

    fn layout_handles(&self) -> Vec<u32> {
        self.layouts.borrow().clone()
    }

    fn active_layout(&self) -> Option<u32> {
        self.active.get()
    }

    fn layout_name(&self) -> Option<String> {
        self.name.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_platform_scripting() {
        let p = MockPlatform::new();
        assert_eq!(p.key_down(VirtualKey::RightAlt), None);

        p.set_right_alt_down(Some(true));
        assert_eq!(p.key_down(VirtualKey::RightAlt), Some(true));

        p.set_numlock(Some(false));
        assert_eq!(p.key_toggled(VirtualKey::NumLock), Some(false));

        p.set_layouts(vec![0x0409, 0x040c]);
        assert_eq!(p.layout_handles(), vec![0x0409, 0x040c]);
    }
}
