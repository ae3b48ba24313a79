// Keybridge AltGr Disambiguation
// Collapses the spurious Control_L + Alt_R pair one platform reports for a
// single physical Right-Alt press, without delaying genuine Control presses
// for longer than a bounded window

use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::event::KeyEvent;
use crate::mask::apply_altgr;
use crate::modifier::Modifier;
use crate::platform::{PlatformKeyboard, VirtualKey};

/// Default pending window in milliseconds.
pub const DEFAULT_CONTROL_KEY_DELAY_MS: u64 = 50;

/// The one in-flight ambiguous Control event.
#[derive(Debug, Clone)]
struct PendingControl {
    event: KeyEvent,
    armed_at: Instant,
}

/// State machine sitting in front of modifier resolution.
///
/// A `Control_L` event that arrives while the live query reports Right Alt
/// up is ambiguous: it is either a genuine Control press or the spurious
/// prefix of an AltGr press. The event is held pending; an `Alt_R` arriving
/// inside the delay window discards it and is itself converted into a pure
/// modifier-refresh event, while expiry of the window (driven by the host
/// calling [`AltGrDisambiguator::check_timeout`]) releases it to normal
/// delivery. At most one pending record ever exists; a newer ambiguous
/// event silently supersedes the previous one.
#[derive(Debug)]
pub struct AltGrDisambiguator {
    enabled: bool,
    delay: Duration,
    altgr_modifier: Option<Modifier>,
    have_mappings: bool,
    pending: Option<PendingControl>,
}

impl AltGrDisambiguator {
    pub fn new(enabled: bool, delay_ms: u64) -> Self {
        Self {
            enabled,
            delay: Duration::from_millis(delay_ms),
            altgr_modifier: None,
            have_mappings: false,
            pending: None,
        }
    }

    /// Update the AltGr role from a rebuilt modifier map. Disambiguation is
    /// inert until a role is bound and mappings are known.
    pub fn bind(&mut self, altgr_modifier: Option<Modifier>, have_mappings: bool) {
        self.altgr_modifier = altgr_modifier;
        self.have_mappings = have_mappings;
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn active(&self) -> bool {
        self.enabled && self.altgr_modifier.is_some() && self.have_mappings
    }

    /// Feed one raw event through the machine. Returns the events to deliver
    /// downstream, in order; an ambiguous Control event produces nothing
    /// until it is resolved.
    pub fn process<P: PlatformKeyboard + ?Sized>(
        &mut self,
        mut event: KeyEvent,
        platform: &P,
    ) -> SmallVec<[KeyEvent; 2]> {
        let mut out: SmallVec<[KeyEvent; 2]> = SmallVec::new();
        if self.active() {
            let right_alt_down = platform.key_down(VirtualKey::RightAlt) == Some(true);
            if event.keyname == "Control_L" {
                log::debug!(
                    "process: Control_L pressed={}, right_alt_down={}",
                    event.pressed,
                    right_alt_down
                );
                if right_alt_down {
                    // Right Alt already down: this Control is the spurious
                    // companion event, swallow it outright.
                    return out;
                }
                if self.pending.is_some() {
                    log::debug!("process: superseding pending Control_L");
                }
                self.pending = Some(PendingControl {
                    event,
                    armed_at: Instant::now(),
                });
                return out;
            }
            if event.keyname == "Alt_R" {
                log::debug!(
                    "process: Alt_R pressed={}, right_alt_down={}",
                    event.pressed,
                    right_alt_down
                );
                if !right_alt_down {
                    // Cancel the Control_L that was due: it was spurious.
                    self.pending = None;
                }
                // Convert into a pure modifier update: no text, no action.
                event.clear_identity();
                apply_altgr(&mut event.modifiers, self.altgr_modifier, right_alt_down);
            }
        }
        if let Some(pending) = self.flush(platform) {
            out.push(pending);
        }
        out.push(event);
        out
    }

    /// Release the pending Control event for normal delivery, unless the
    /// live query now reports Right Alt down, in which case it is dropped.
    pub fn flush<P: PlatformKeyboard + ?Sized>(&mut self, platform: &P) -> Option<KeyEvent> {
        let pending = self.pending.take()?;
        let right_alt_down = platform.key_down(VirtualKey::RightAlt) == Some(true);
        log::debug!("flush() right_alt_down={}", right_alt_down);
        if right_alt_down {
            None
        } else {
            Some(pending.event)
        }
    }

    /// Host-driven timer: once the delay window has elapsed with no
    /// disambiguating event, the pending Control was genuine and is
    /// released. Cancellation is inherent: a resolved or superseded record
    /// is gone before the next poll, so a stale expiry acts on nothing.
    pub fn check_timeout<P: PlatformKeyboard + ?Sized>(
        &mut self,
        platform: &P,
    ) -> Option<KeyEvent> {
        let armed_at = self.pending.as_ref()?.armed_at;
        if armed_at.elapsed() >= self.delay {
            self.flush(platform)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;

    fn machine(delay_ms: u64) -> AltGrDisambiguator {
        let mut m = AltGrDisambiguator::new(true, delay_ms);
        m.bind(Some(Modifier::Mod5), true);
        m
    }

    fn control_press() -> KeyEvent {
        let mut ev = KeyEvent::new("Control_L", 65507, 162, true);
        ev.modifiers.push(Modifier::Control);
        ev
    }

    fn alt_r_press() -> KeyEvent {
        let mut ev = KeyEvent::new("Alt_R", 65514, 165, true);
        ev.modifiers.push(Modifier::Control);
        ev.modifiers.push(Modifier::Mod1);
        ev
    }

    #[test]
    fn test_altgr_sequence_never_delivers_control() {
        let mut m = machine(50);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        let out = m.process(control_press(), &p);
        assert!(out.is_empty());
        assert!(m.has_pending());

        // By the time Alt_R is processed the key is physically down
        p.set_right_alt_down(Some(true));
        let out = m.process(alt_r_press(), &p);

        // Exactly one modifier-refresh event, no Control_L
        assert_eq!(out.len(), 1);
        assert!(out[0].is_modifier_refresh());
        assert!(out[0].modifiers.contains(&Modifier::Mod5));
        assert!(!out[0].modifiers.contains(&Modifier::Control));
        assert!(!out[0].modifiers.contains(&Modifier::Mod1));
        assert!(!m.has_pending());

        // Nothing left to expire
        std::thread::sleep(Duration::from_millis(60));
        assert!(m.check_timeout(&p).is_none());
    }

    #[test]
    fn test_altgr_sequence_with_key_still_reported_up() {
        let mut m = machine(50);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        assert!(m.process(control_press(), &p).is_empty());
        // The live query still reports up when Alt_R is processed: the
        // pending Control is cancelled and the AltGr token cleared.
        let out = m.process(alt_r_press(), &p);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_modifier_refresh());
        assert!(!out[0].modifiers.contains(&Modifier::Mod5));
        assert!(!out[0].modifiers.contains(&Modifier::Control));
    }

    #[test]
    fn test_genuine_control_released_after_window() {
        let mut m = machine(20);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        assert!(m.process(control_press(), &p).is_empty());
        // Window not elapsed yet
        assert!(m.check_timeout(&p).is_none());

        std::thread::sleep(Duration::from_millis(30));
        let released = m.check_timeout(&p).expect("pending Control releases");
        assert_eq!(released.keyname, "Control_L");
        assert!(released.pressed);

        // Exactly once
        assert!(m.check_timeout(&p).is_none());
        assert!(!m.has_pending());
    }

    #[test]
    fn test_second_control_supersedes_pending() {
        let mut m = machine(20);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        assert!(m.process(control_press(), &p).is_empty());
        let mut release = control_press();
        release.pressed = false;
        assert!(m.process(release, &p).is_empty());

        std::thread::sleep(Duration::from_millis(30));
        // Only the newest pending event survives
        let released = m.check_timeout(&p).unwrap();
        assert!(!released.pressed);
        assert!(m.check_timeout(&p).is_none());
    }

    #[test]
    fn test_unrelated_event_flushes_pending_first() {
        let mut m = machine(50);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        assert!(m.process(control_press(), &p).is_empty());
        let out = m.process(KeyEvent::new("a", 97, 65, true), &p);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].keyname, "Control_L");
        assert_eq!(out[1].keyname, "a");
    }

    #[test]
    fn test_spurious_control_with_right_alt_already_down() {
        let mut m = machine(50);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(true));

        let out = m.process(control_press(), &p);
        assert!(out.is_empty());
        // Swallowed, not held: nothing pending
        assert!(!m.has_pending());
    }

    #[test]
    fn test_inert_without_altgr_binding() {
        let mut m = AltGrDisambiguator::new(true, 50);
        m.bind(None, true);
        let p = MockPlatform::new();
        p.set_right_alt_down(Some(false));

        let out = m.process(control_press(), &p);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keyname, "Control_L");
    }

    #[test]
    fn test_inert_when_disabled() {
        let mut m = AltGrDisambiguator::new(false, 50);
        m.bind(Some(Modifier::Mod5), true);
        let p = MockPlatform::new();

        let out = m.process(control_press(), &p);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keyname, "Control_L");
    }
}
