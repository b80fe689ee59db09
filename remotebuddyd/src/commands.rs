//! Fixed mapping from normalized key names to playback commands.

/// Query parameters sent to the command endpoint for one key
pub type CommandPayload = &'static [(&'static str, &'static str)];

const TOGGLE: CommandPayload = &[("cmd", "toggle")];
const VOLUME_DOWN: CommandPayload = &[("cmd", "volume"), ("volume", "minus")];
const VOLUME_UP: CommandPayload = &[("cmd", "volume"), ("volume", "plus")];
const PREVIOUS: CommandPayload = &[("cmd", "prev")];
const NEXT: CommandPayload = &[("cmd", "next")];
const MUTE: CommandPayload = &[("cmd", "volume"), ("volume", "toggle")];

/// Look up the playback command bound to `key`
pub fn command_for(key: &str) -> Option<CommandPayload> {
    match key {
        "PLAYPAUSE" => Some(TOGGLE),
        "VOLUMEDOWN" => Some(VOLUME_DOWN),
        "VOLUMEUP" => Some(VOLUME_UP),
        "PREVIOUSSONG" => Some(PREVIOUS),
        "NEXTSONG" => Some(NEXT),
        "MUTE" => Some(MUTE),
        _ => None,
    }
}
