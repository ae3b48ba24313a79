// Keybridge Keyboard Pipeline
// Per-platform orchestrator: translation quirks, Hyper carrier, AltGr
// disambiguation, modifier resolution and layout/repeat queries

use indexmap::IndexMap;

use crate::altgr::AltGrDisambiguator;
use crate::event::{KeyEvent, HYPER_KEYCODE, HYPER_KEYVAL};
use crate::layout::{get_keyboard_repeat, get_layout_spec, LayoutSpec};
use crate::mask::{MaskResolver, ModifierSet};
use crate::modifier::{Modifier, ModifierMap};
use crate::platform::PlatformKeyboard;
use crate::settings::Settings;
use crate::translate::KeyTranslationTable;

/// The client-side keyboard normalization pipeline.
///
/// One instance per session, running on the event-processing thread. Raw
/// toolkit events go through [`Keyboard::process_key_event`]; the host event
/// loop also calls [`Keyboard::poll_delayed`] so a pending ambiguous Control
/// event is released once its window elapses.
#[derive(Debug)]
pub struct Keyboard<P: PlatformKeyboard> {
    platform: P,
    settings: Settings,
    translations: KeyTranslationTable,
    resolver: MaskResolver,
    disambiguator: AltGrDisambiguator,
    /// Sticky flag: the synthetic Hyper carrier key is currently held
    hyper_modifier: bool,
    last_layout_message: Option<String>,
}

impl<P: PlatformKeyboard> Keyboard<P> {
    pub fn new(platform: P) -> Self {
        Self::with_settings(platform, Settings::from_env())
    }

    pub fn with_settings(platform: P, settings: Settings) -> Self {
        Self {
            platform,
            settings,
            translations: KeyTranslationTable::with_locale_overrides(),
            resolver: MaskResolver::new(settings.emulate_altgr),
            disambiguator: AltGrDisambiguator::new(
                settings.emulate_altgr,
                settings.altgr_control_key_delay_ms,
            ),
            hyper_modifier: false,
            last_layout_message: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the key/modifier associations after a keymap or layout
    /// change. The resolver and the disambiguator both rebind their roles.
    pub fn set_modifier_mappings(&mut self, map: ModifierMap) {
        let have_mappings = !map.is_empty();
        self.resolver.bind(map);
        self.disambiguator
            .bind(self.resolver.altgr_modifier(), have_mappings);
    }

    /// Resolve a raw modifier bitmask into canonical tokens, quirks applied.
    pub fn mask_to_names(&self, mask: u32) -> ModifierSet {
        self.resolver.resolve(mask, &self.platform)
    }

    /// Canonical name for a key triple.
    pub fn translate_key<'a>(&'a self, keyname: &'a str, keyval: i32, keycode: i32) -> &'a str {
        self.translations.translate(keyname, keyval, keycode)
    }

    /// Feed one raw key event through the pipeline. Normalized events come
    /// out through `sink`, in delivery order; an event may be held back,
    /// dropped, or relabeled on the way.
    pub fn process_key_event(&mut self, mut event: KeyEvent, sink: &mut dyn FnMut(KeyEvent)) {
        if event.is_void() {
            log::debug!("process_key_event: ignoring {}", event);
            return;
        }

        let translated = self
            .translations
            .translate(&event.keyname, event.keyval, event.keycode)
            .to_string();
        if translated != event.keyname {
            event.keyname = translated;
        }

        if self.settings.hyper_carrier {
            if event.keyname == "Delete" {
                // Relabel the carrier key as a synthetic Hyper modifier
                event.keyname = "Hyper_L".to_string();
                event.keyval = HYPER_KEYVAL;
                event.keycode = HYPER_KEYCODE;
                event.group = 0;
                self.hyper_modifier = event.pressed;
                self.resolver.set_hyper_active(self.hyper_modifier);
                log::debug!("hyper carrier pressed={}", event.pressed);
            } else if self.hyper_modifier && !event.modifiers.contains(&Modifier::Mod4) {
                event.modifiers.push(Modifier::Mod4);
            }
        }

        for out in self.disambiguator.process(event, &self.platform) {
            sink(out);
        }
    }

    /// Drive the disambiguation timer. The host event loop calls this
    /// periodically; a pending Control event whose window has elapsed is
    /// delivered through `sink` as a genuine key press.
    pub fn poll_delayed(&mut self, sink: &mut dyn FnMut(KeyEvent)) {
        if let Some(event) = self.disambiguator.check_timeout(&self.platform) {
            sink(event);
        }
    }

    pub fn has_delayed_event(&self) -> bool {
        self.disambiguator.has_pending()
    }

    /// Resolved layout information, logged once per layout change.
    pub fn layout_spec(&mut self) -> LayoutSpec {
        let spec = get_layout_spec(&self.platform);
        if let Some(layout) = &spec.layout {
            if self.last_layout_message.as_deref() != Some(layout) {
                log::info!("keyboard layout '{}'", layout);
                self.last_layout_message = Some(layout.clone());
            }
        }
        spec
    }

    /// Normalized keyboard repeat (delay ms, speed chars/s), if known.
    pub fn keyboard_repeat(&self) -> Option<(u32, u32)> {
        get_keyboard_repeat(&self.platform)
    }

    /// Flat, ordered snapshot of the keymap-related state for the protocol
    /// layer. Structurally equal across calls while the platform state is
    /// unchanged.
    pub fn keymap_properties(&mut self) -> IndexMap<String, String> {
        let spec = get_layout_spec(&self.platform);
        let repeat = self.keyboard_repeat();

        let mut props = IndexMap::new();
        let mut put = |key: &str, value: String| {
            props.insert(key.to_string(), value);
        };
        put("layout", spec.layout.clone().unwrap_or_default());
        put("layouts", spec.layouts.join(","));
        put("variant", spec.variant.clone().unwrap_or_default());
        put("variants", spec.variants.join(","));
        put("options", spec.options.clone());
        put(
            "repeat_delay",
            repeat.map(|(d, _)| d.to_string()).unwrap_or_default(),
        );
        put(
            "repeat_speed",
            repeat.map(|(_, s)| s.to_string()).unwrap_or_default(),
        );
        put("swap_keys", self.platform.swap_keys().to_string());
        put(
            "emulate_altgr",
            self.settings.emulate_altgr.to_string(),
        );
        put(
            "altgr_control_key_delay",
            self.settings.altgr_control_key_delay_ms.to_string(),
        );
        put("hyper_carrier", self.settings.hyper_carrier.to_string());
        put(
            "numlock_modifier",
            self.resolver
                .numlock_modifier()
                .map(|m| m.to_string())
                .unwrap_or_default(),
        );
        put(
            "altgr_modifier",
            self.resolver
                .altgr_modifier()
                .map(|m| m.to_string())
                .unwrap_or_default(),
        );
        put(
            "modifier_keys",
            self.resolver
                .modifier_map()
                .bound_modifiers()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        props
    }
}
