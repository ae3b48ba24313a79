// Keybridge Modifier Mask Resolver
// Decomposes raw modifier bitmasks into canonical tokens, with quirk fix-ups

use smallvec::SmallVec;

use crate::modifier::{canonical_order, Modifier, ModifierMap};
use crate::platform::{PlatformKeyboard, VirtualKey};

pub const SHIFT_MASK: u32 = 1 << 0;
pub const LOCK_MASK: u32 = 1 << 1;
pub const CONTROL_MASK: u32 = 1 << 2;
pub const MOD1_MASK: u32 = 1 << 3;
pub const MOD2_MASK: u32 = 1 << 4;
pub const MOD3_MASK: u32 = 1 << 5;
pub const MOD4_MASK: u32 = 1 << 6;
pub const MOD5_MASK: u32 = 1 << 7;
pub const SUPER_MASK: u32 = 1 << 26;
pub const HYPER_MASK: u32 = 1 << 27;
pub const META_MASK: u32 = 1 << 28;

/// Modifier list as produced by the resolver.
pub type ModifierSet = SmallVec<[Modifier; 8]>;

impl Modifier {
    /// Raw mask bit this token decomposes from, if it has one.
    pub const fn mask(self) -> u32 {
        match self {
            Modifier::Shift => SHIFT_MASK,
            Modifier::Lock => LOCK_MASK,
            Modifier::Control => CONTROL_MASK,
            Modifier::Mod1 => MOD1_MASK,
            Modifier::Mod2 => MOD2_MASK,
            Modifier::Mod3 => MOD3_MASK,
            Modifier::Mod4 => MOD4_MASK,
            Modifier::Mod5 => MOD5_MASK,
            Modifier::Super => SUPER_MASK,
            Modifier::Hyper => HYPER_MASK,
            Modifier::Meta => META_MASK,
        }
    }
}

/// Add the bound AltGr token and strip the tokens the OS spuriously reports
/// alongside a Right-Alt press (mod1, mod2, control). On release the AltGr
/// token is stripped as well. A missing AltGr binding only skips the
/// injection, the strip still applies.
pub(crate) fn apply_altgr<A: smallvec::Array<Item = Modifier>>(
    modifiers: &mut SmallVec<A>,
    altgr: Option<Modifier>,
    pressed: bool,
) {
    let mut add: SmallVec<[Modifier; 1]> = SmallVec::new();
    let mut clear: SmallVec<[Modifier; 4]> =
        SmallVec::from_slice(&[Modifier::Mod1, Modifier::Mod2, Modifier::Control]);
    if let Some(altgr) = altgr {
        if pressed {
            add.push(altgr);
        } else {
            clear.push(altgr);
        }
    }
    log::debug!(
        "apply_altgr({:?}, pressed={}) altgr={:?}, add={:?}, clear={:?}",
        modifiers,
        pressed,
        altgr,
        add,
        clear
    );
    for m in add {
        if !modifiers.contains(&m) {
            modifiers.push(m);
        }
    }
    modifiers.retain(|m| !clear.contains(m));
}

/// Resolves raw modifier bitmasks into canonical token sets.
///
/// The base decomposition walks the tokens in canonical order, so equal
/// logical states always produce identical sequences. Quirk hooks run after
/// the decomposition, in a fixed order:
///
/// 1. swap the control and meta tokens when the platform swaps those keys
/// 2. inject the emulated-hyper token while the synthetic Hyper key is held
/// 3. reconcile the NumLock token against the live lock state (the toolkit
///    under-reports it in the mask)
/// 4. when AltGr emulation is on and Right Alt is physically down, inject the
///    bound AltGr token and strip the spurious control/mod1/mod2 tokens
#[derive(Debug)]
pub struct MaskResolver {
    map: ModifierMap,
    numlock_modifier: Option<Modifier>,
    altgr_modifier: Option<Modifier>,
    emulate_altgr: bool,
    hyper_active: bool,
}

impl MaskResolver {
    pub fn new(emulate_altgr: bool) -> Self {
        Self {
            map: ModifierMap::new(),
            numlock_modifier: None,
            altgr_modifier: None,
            emulate_altgr,
            hyper_active: false,
        }
    }

    /// Replace the active key/modifier associations. Must be called on every
    /// keymap or layout change notification; the cached NumLock and AltGr
    /// roles are rebuilt from the new map.
    pub fn bind(&mut self, map: ModifierMap) {
        self.numlock_modifier = map.numlock_modifier();
        self.altgr_modifier = map.altgr_modifier();
        log::debug!(
            "bind() numlock_modifier={:?}, altgr_modifier={:?}",
            self.numlock_modifier,
            self.altgr_modifier
        );
        self.map = map;
    }

    pub fn modifier_map(&self) -> &ModifierMap {
        &self.map
    }

    pub fn altgr_modifier(&self) -> Option<Modifier> {
        self.altgr_modifier
    }

    pub fn numlock_modifier(&self) -> Option<Modifier> {
        self.numlock_modifier
    }

    /// Track whether the synthetic Hyper key is currently held.
    pub fn set_hyper_active(&mut self, active: bool) {
        self.hyper_active = active;
    }

    /// Decompose a raw mask into canonical tokens and apply the quirk hooks.
    pub fn resolve<P: PlatformKeyboard + ?Sized>(&self, mask: u32, platform: &P) -> ModifierSet {
        let mut names: ModifierSet = canonical_order()
            .filter(|m| mask & m.mask() != 0)
            .collect();

        if platform.swap_keys() {
            for m in names.iter_mut() {
                *m = match *m {
                    Modifier::Control => Modifier::Meta,
                    Modifier::Meta => Modifier::Control,
                    other => other,
                };
            }
        }

        if self.hyper_active && !names.contains(&Modifier::Mod4) {
            names.push(Modifier::Mod4);
        }

        if let Some(numlock) = self.numlock_modifier {
            // The mask misreports NumLock, so trust the live lock state.
            // An unanswered query leaves the mask-derived state alone.
            match platform.key_toggled(VirtualKey::NumLock) {
                Some(true) => {
                    if !names.contains(&numlock) {
                        names.push(numlock);
                    }
                }
                Some(false) => names.retain(|m| *m != numlock),
                None => log::debug!("resolve({:#x}) numlock state query failed", mask),
            }
        }

        if self.emulate_altgr && platform.key_down(VirtualKey::RightAlt) == Some(true) {
            apply_altgr(&mut names, self.altgr_modifier, true);
        }

        log::debug!("resolve({:#x}) = {:?}", mask, names);
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;

    fn resolver() -> MaskResolver {
        let mut r = MaskResolver::new(true);
        r.bind(ModifierMap::pc105());
        r
    }

    fn names(set: &ModifierSet) -> Vec<Modifier> {
        set.iter().copied().collect()
    }

    #[test]
    fn test_plain_decomposition() {
        let r = resolver();
        let p = MockPlatform::new();
        assert_eq!(names(&r.resolve(SHIFT_MASK, &p)), vec![Modifier::Shift]);
        assert_eq!(names(&r.resolve(LOCK_MASK, &p)), vec![Modifier::Lock]);
        assert_eq!(
            names(&r.resolve(SHIFT_MASK | CONTROL_MASK, &p)),
            vec![Modifier::Shift, Modifier::Control]
        );
        assert!(r.resolve(0, &p).is_empty());
    }

    #[test]
    fn test_canonical_order_is_stable() {
        let r = resolver();
        let p = MockPlatform::new();
        // The mask has no inherent order; the output always does.
        let set = r.resolve(MOD1_MASK | SHIFT_MASK | CONTROL_MASK, &p);
        assert_eq!(
            names(&set),
            vec![Modifier::Shift, Modifier::Control, Modifier::Mod1]
        );
    }

    #[test]
    fn test_resolve_is_idempotent_for_same_live_state() {
        let r = resolver();
        let p = MockPlatform::new();
        p.set_numlock(Some(true));
        let a = r.resolve(SHIFT_MASK | MOD1_MASK, &p);
        let b = r.resolve(SHIFT_MASK | MOD1_MASK, &p);
        assert_eq!(a, b);
    }

    #[test]
    fn test_swap_keys_quirk() {
        let r = resolver();
        let p = MockPlatform::new();
        p.set_swap_keys(true);
        assert_eq!(
            names(&r.resolve(SHIFT_MASK | META_MASK, &p)),
            vec![Modifier::Shift, Modifier::Control]
        );
        assert_eq!(
            names(&r.resolve(CONTROL_MASK, &p)),
            vec![Modifier::Meta]
        );
        // Swap off: meta stays meta
        p.set_swap_keys(false);
        assert_eq!(
            names(&r.resolve(SHIFT_MASK | CONTROL_MASK, &p)),
            vec![Modifier::Shift, Modifier::Control]
        );
    }

    #[test]
    fn test_hyper_injection() {
        let mut r = resolver();
        let p = MockPlatform::new();
        r.set_hyper_active(true);
        assert_eq!(
            names(&r.resolve(SHIFT_MASK, &p)),
            vec![Modifier::Shift, Modifier::Mod4]
        );
        // Already present in the mask: not duplicated
        assert_eq!(
            names(&r.resolve(MOD4_MASK, &p)),
            vec![Modifier::Mod4]
        );
        r.set_hyper_active(false);
        assert_eq!(names(&r.resolve(SHIFT_MASK, &p)), vec![Modifier::Shift]);
    }

    #[test]
    fn test_numlock_reconciliation() {
        let r = resolver();
        let p = MockPlatform::new();

        // Lock on but missing from the mask: injected
        p.set_numlock(Some(true));
        assert!(r.resolve(0, &p).contains(&Modifier::Mod2));

        // Lock off but present in the mask: removed
        p.set_numlock(Some(false));
        assert!(!r.resolve(MOD2_MASK, &p).contains(&Modifier::Mod2));

        // Query failure: mask state left alone
        p.set_numlock(None);
        assert!(r.resolve(MOD2_MASK, &p).contains(&Modifier::Mod2));
        assert!(!r.resolve(0, &p).contains(&Modifier::Mod2));
    }

    #[test]
    fn test_numlock_noop_without_binding() {
        let mut r = MaskResolver::new(true);
        r.bind(ModifierMap::from_mappings([(
            Modifier::Control,
            vec!["Control_L"],
        )]));
        let p = MockPlatform::new();
        p.set_numlock(Some(true));
        // No key bound to NumLock on this layout: injection step is a no-op
        assert!(r.resolve(0, &p).is_empty());
    }

    #[test]
    fn test_altgr_injection_strips_spurious_tokens() {
        let r = resolver();
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(true));
        let set = r.resolve(CONTROL_MASK | MOD1_MASK | SHIFT_MASK, &p);
        assert_eq!(names(&set), vec![Modifier::Shift, Modifier::Mod5]);
    }

    #[test]
    fn test_altgr_without_binding_still_strips() {
        let mut r = MaskResolver::new(true);
        r.bind(ModifierMap::from_mappings([(
            Modifier::Control,
            vec!["Control_L", "Control_R"],
        )]));
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(true));
        let set = r.resolve(CONTROL_MASK | SHIFT_MASK, &p);
        assert_eq!(names(&set), vec![Modifier::Shift]);
    }

    #[test]
    fn test_altgr_disabled_or_key_up() {
        let mut r = MaskResolver::new(false);
        r.bind(ModifierMap::pc105());
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(true));
        // Emulation off: control survives
        assert!(r.resolve(CONTROL_MASK, &p).contains(&Modifier::Control));

        let r = resolver();
        p.set_right_alt_down(Some(false));
        assert!(r.resolve(CONTROL_MASK, &p).contains(&Modifier::Control));
        // Query failure counts as "not down"
        p.set_right_alt_down(None);
        assert!(r.resolve(CONTROL_MASK, &p).contains(&Modifier::Control));
    }

    #[test]
    fn test_rebind_replaces_roles() {
        let mut r = resolver();
        assert_eq!(r.altgr_modifier(), Some(Modifier::Mod5));
        r.bind(ModifierMap::from_mappings([(
            Modifier::Mod3,
            vec!["ISO_Level3_Shift"],
        )]));
        assert_eq!(r.altgr_modifier(), Some(Modifier::Mod3));
        assert_eq!(r.numlock_modifier(), None);
    }
}
