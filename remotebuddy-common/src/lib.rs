use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// Re-export common dependencies
pub use serde;
pub use tokio;
pub use tracing;

/// Linux key code for the numeric "0" key
pub const KEY_0: u16 = 11;
/// Linux key code for the volume-down key
pub const KEY_VOLUMEDOWN: u16 = 114;

/// Name used for keys the input library reports without a symbolic name.
/// Some remotes send their mute button this way.
pub const UNNAMED_KEY_ALIAS: &str = "MUTE";

/// Information about a connected input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub path: PathBuf,
    pub vendor_id: u16,
    pub product_id: u16,
    pub phys: String,
    /// Key codes the device declares it can report
    pub keys: Vec<u16>,
}

impl DeviceInfo {
    /// Whether this device looks like a remote control rather than a plain
    /// keyboard or mouse
    pub fn is_suitable(&self) -> bool {
        is_suitable(&self.keys)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (VID: {:04X}, PID: {:04X})",
               self.name, self.vendor_id, self.product_id)
    }
}

/// Suitability heuristic: a device qualifies when it can report either a
/// volume-down key or a numeric "0" key.
pub fn is_suitable(keys: &[u16]) -> bool {
    keys.iter().any(|&k| k == KEY_VOLUMEDOWN || k == KEY_0)
}

/// State carried in the value field of a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    Released,
    Pressed,
    Repeated,
}

impl KeyState {
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeated),
            _ => None,
        }
    }
}

/// One event as read from a device, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A key event. `symbol` is the input library's name for the code
    /// (e.g. `KEY_VOLUMEUP`), or empty when the code has none.
    Key { code: u16, symbol: String, value: i32 },
    /// Sync, relative, absolute and every other non-key event
    Other,
}

/// A normalized key press ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub code: u16,
    pub name: String,
}

/// Strip the source-library prefix (`KEY_`, `BTN_`) from a symbolic key
/// name. An empty result is remapped to [`UNNAMED_KEY_ALIAS`].
pub fn normalize_key_name(symbol: &str) -> String {
    let name = symbol
        .strip_prefix("KEY_")
        .or_else(|| symbol.strip_prefix("BTN_"))
        .unwrap_or(symbol);

    if name.is_empty() {
        UNNAMED_KEY_ALIAS.to_string()
    } else {
        name.to_string()
    }
}
