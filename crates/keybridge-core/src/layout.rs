// Keybridge Layout Queries
// Maps native layout handles/identifiers to X11 layout names, normalizes
// keyboard repeat parameters

use indexmap::IndexMap;

use crate::platform::PlatformKeyboard;

/// Masks and bit shifts tried, in order, when extracting a keyboard id from
/// a native layout handle.
const KMASKS: &[(u32, &[u32])] = &[(0xffff_ffff, &[0, 16]), (0xffff, &[0]), (0x3ff, &[0])];

/// One known keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDef {
    /// Native keyboard id (low word of the layout handle)
    pub kbid: u32,
    /// ISO country/language code
    pub code: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// X11 layout name used on the wire
    pub x11_name: &'static str,
}

/// Known layouts, keyed by native keyboard id.
pub const LAYOUTS: &[LayoutDef] = &[
    LayoutDef { kbid: 0x0401, code: "ARA", description: "Arabic", x11_name: "ar" },
    LayoutDef { kbid: 0x0405, code: "CSY", description: "Czech", x11_name: "cz" },
    LayoutDef { kbid: 0x0406, code: "DAN", description: "Danish", x11_name: "dk" },
    LayoutDef { kbid: 0x0407, code: "GER", description: "German", x11_name: "de" },
    LayoutDef { kbid: 0x0408, code: "ELL", description: "Greek", x11_name: "gr" },
    LayoutDef { kbid: 0x0409, code: "USA", description: "English (US)", x11_name: "us" },
    LayoutDef { kbid: 0x040a, code: "ESP", description: "Spanish", x11_name: "es" },
    LayoutDef { kbid: 0x040b, code: "FIN", description: "Finnish", x11_name: "fi" },
    LayoutDef { kbid: 0x040c, code: "FRA", description: "French", x11_name: "fr" },
    LayoutDef { kbid: 0x040d, code: "HEB", description: "Hebrew", x11_name: "il" },
    LayoutDef { kbid: 0x040e, code: "HUN", description: "Hungarian", x11_name: "hu" },
    LayoutDef { kbid: 0x0410, code: "ITA", description: "Italian", x11_name: "it" },
    LayoutDef { kbid: 0x0411, code: "JPN", description: "Japanese", x11_name: "jp" },
    LayoutDef { kbid: 0x0412, code: "KOR", description: "Korean", x11_name: "kr" },
    LayoutDef { kbid: 0x0413, code: "NLD", description: "Dutch", x11_name: "nl" },
    LayoutDef { kbid: 0x0414, code: "NOR", description: "Norwegian", x11_name: "no" },
    LayoutDef { kbid: 0x0415, code: "PLK", description: "Polish", x11_name: "pl" },
    LayoutDef { kbid: 0x0416, code: "PTB", description: "Portuguese (Brazil)", x11_name: "br" },
    LayoutDef { kbid: 0x0418, code: "ROM", description: "Romanian", x11_name: "ro" },
    LayoutDef { kbid: 0x0419, code: "RUS", description: "Russian", x11_name: "ru" },
    LayoutDef { kbid: 0x041a, code: "HRV", description: "Croatian", x11_name: "hr" },
    LayoutDef { kbid: 0x041b, code: "SKY", description: "Slovak", x11_name: "sk" },
    LayoutDef { kbid: 0x041d, code: "SVE", description: "Swedish", x11_name: "se" },
    LayoutDef { kbid: 0x041f, code: "TRK", description: "Turkish", x11_name: "tr" },
    LayoutDef { kbid: 0x0422, code: "UKR", description: "Ukrainian", x11_name: "ua" },
    LayoutDef { kbid: 0x0424, code: "SLV", description: "Slovenian", x11_name: "si" },
    LayoutDef { kbid: 0x0425, code: "ETI", description: "Estonian", x11_name: "ee" },
    LayoutDef { kbid: 0x0427, code: "LTH", description: "Lithuanian", x11_name: "lt" },
    LayoutDef { kbid: 0x0807, code: "GSW", description: "German (Switzerland)", x11_name: "ch" },
    LayoutDef { kbid: 0x0809, code: "ENG", description: "English (UK)", x11_name: "gb" },
    LayoutDef { kbid: 0x0816, code: "PTG", description: "Portuguese", x11_name: "pt" },
    LayoutDef { kbid: 0x080a, code: "ESM", description: "Spanish (Mexico)", x11_name: "latam" },
    LayoutDef { kbid: 0x0c0c, code: "FRC", description: "French (Canada)", x11_name: "ca" },
];

/// Resolved layout information for the protocol layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutSpec {
    pub layout: Option<String>,
    pub layouts: Vec<String>,
    pub variant: Option<String>,
    pub variants: Vec<String>,
    pub options: String,
}

pub fn layout_for_kbid(kbid: u32) -> Option<&'static LayoutDef> {
    LAYOUTS.iter().find(|l| l.kbid == kbid)
}

/// Extract a known layout from a native layout handle by trying each mask
/// and bit shift in turn.
pub fn layout_for_handle(handle: u32) -> Option<&'static LayoutDef> {
    for (mask, bitshifts) in KMASKS {
        for bitshift in *bitshifts {
            let kbid = (handle & mask) >> bitshift;
            if let Some(def) = layout_for_kbid(kbid) {
                return Some(def);
            }
        }
    }
    None
}

/// Build the layout spec from the platform's enumerated handles, the active
/// layout handle and the hex layout-name query. Every query is best-effort;
/// an unanswered one narrows the result instead of failing.
pub fn get_layout_spec<P: PlatformKeyboard + ?Sized>(platform: &P) -> LayoutSpec {
    // First-seen order of enumerated layouts is preserved
    let mut layouts_defs: IndexMap<&'static str, u32> = IndexMap::new();
    for handle in platform.layout_handles() {
        if let Some(def) = layout_for_handle(handle) {
            log::debug!(
                "found layout '{}' ({}) for handle {:#x}",
                def.x11_name,
                def.description,
                handle
            );
            layouts_defs.entry(def.x11_name).or_insert(handle);
        }
    }

    let mut layout: Option<&'static LayoutDef> = None;

    // The layout-name query returns a hex identifier string
    if let Some(name) = platform.layout_name() {
        match u32::from_str_radix(&name, 16) {
            Ok(ival) => {
                for (mask, _) in KMASKS {
                    if let Some(def) = layout_for_kbid(ival & mask) {
                        layouts_defs.entry(def.x11_name).or_insert(ival);
                        layout = Some(def);
                        break;
                    }
                }
                if layout.is_none() {
                    log::warn!("unknown keyboard layout identifier {:#x}", ival);
                }
            }
            Err(_) => log::warn!("failed to parse keyboard layout code {:?}", name),
        }
    }

    // The active layout handle decides when the name query did not
    if layout.is_none() {
        if let Some(active) = platform.active_layout() {
            if let Some(def) = layout_for_handle(active) {
                layouts_defs.entry(def.x11_name).or_insert(active);
                layout = Some(def);
            }
        }
    }

    let layouts: Vec<String> = layouts_defs.keys().map(|s| s.to_string()).collect();
    let layout = layout
        .map(|d| d.x11_name.to_string())
        .or_else(|| layouts.first().cloned());

    LayoutSpec {
        layout,
        layouts,
        variant: None,
        variants: Vec::new(),
        options: String::new(),
    }
}

/// Keyboard repeat (delay ms, speed chars/s) normalized from the platform's
/// raw parameter units: raw delay 0..=3 maps to 250..=1000 ms, raw speed
/// 0..=31 maps to roughly 2.5..=30 repeats per second.
pub fn get_keyboard_repeat<P: PlatformKeyboard + ?Sized>(platform: &P) -> Option<(u32, u32)> {
    let (raw_delay, raw_speed) = platform.raw_keyboard_repeat()?;
    let delay = (raw_delay.max(0) as u32 + 1) * 250;
    let raw_speed = raw_speed.clamp(0, 31) as f64;
    let speed = (1000.0 / (2.5 + 27.5 * raw_speed / 31.0)) as u32;
    log::debug!(
        "keyboard repeat delay({})={}, speed({})={}",
        raw_delay,
        delay,
        raw_speed,
        speed
    );
    Some((delay, speed))
}
