// Keybridge Settings
// Environment-style feature toggles for the normalization pipeline

use crate::altgr::DEFAULT_CONTROL_KEY_DELAY_MS;

pub const EMULATE_ALTGR_ENV: &str = "KEYBRIDGE_EMULATE_ALTGR";
pub const ALTGR_CONTROL_KEY_DELAY_ENV: &str = "KEYBRIDGE_ALTGR_CONTROL_KEY_DELAY";
pub const HYPER_CARRIER_ENV: &str = "KEYBRIDGE_HYPER_CARRIER";

/// Read a boolean toggle from the environment.
///
/// Accepts 1/true/yes/on and 0/false/no/off (case-insensitive); anything
/// else is logged and falls back to the default.
pub fn envbool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                log::warn!("{}={:?} is not a boolean, using {}", name, other, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Read an integer from the environment, falling back to the default on
/// absence or parse failure.
pub fn envint(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("{}={:?} is not an integer, using {}", name, value, default);
            default
        }),
        Err(_) => default,
    }
}

/// Pipeline feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Emulate AltGr from the spurious Control_L / Alt_R event pair.
    pub emulate_altgr: bool,
    /// Disambiguation window for the pending Control event, in milliseconds.
    pub altgr_control_key_delay_ms: u64,
    /// Relabel Delete as a synthetic Hyper modifier carrier (experimental).
    pub hyper_carrier: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            emulate_altgr: true,
            altgr_control_key_delay_ms: DEFAULT_CONTROL_KEY_DELAY_MS,
            hyper_carrier: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            emulate_altgr: envbool(EMULATE_ALTGR_ENV, defaults.emulate_altgr),
            altgr_control_key_delay_ms: envint(
                ALTGR_CONTROL_KEY_DELAY_ENV,
                defaults.altgr_control_key_delay_ms as i64,
            )
            .max(0) as u64,
            hyper_carrier: envbool(HYPER_CARRIER_ENV, defaults.hyper_carrier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.emulate_altgr);
        assert_eq!(s.altgr_control_key_delay_ms, 50);
        assert!(!s.hyper_carrier);
    }

    #[test]
    fn test_envbool_vocabulary() {
        // Unset: default wins
        assert!(envbool("KEYBRIDGE_TEST_UNSET_BOOL", true));
        assert!(!envbool("KEYBRIDGE_TEST_UNSET_BOOL", false));

        std::env::set_var("KEYBRIDGE_TEST_BOOL", "on");
        assert!(envbool("KEYBRIDGE_TEST_BOOL", false));
        std::env::set_var("KEYBRIDGE_TEST_BOOL", "NO");
        assert!(!envbool("KEYBRIDGE_TEST_BOOL", true));
        std::env::set_var("KEYBRIDGE_TEST_BOOL", "maybe");
        assert!(envbool("KEYBRIDGE_TEST_BOOL", true));
        std::env::remove_var("KEYBRIDGE_TEST_BOOL");
    }

    #[test]
    fn test_envint_fallback() {
        assert_eq!(envint("KEYBRIDGE_TEST_UNSET_INT", 50), 50);
        std::env::set_var("KEYBRIDGE_TEST_INT", "75");
        assert_eq!(envint("KEYBRIDGE_TEST_INT", 50), 75);
        std::env::set_var("KEYBRIDGE_TEST_INT", "soon");
        assert_eq!(envint("KEYBRIDGE_TEST_INT", 50), 50);
        std::env::remove_var("KEYBRIDGE_TEST_INT");
    }
}
