use flanker_core::Key;
use winit::keyboard::{Key as WinitKey, NamedKey};

/// Layout-aware mapping of a winit key to a session key. Keys the
/// experiment never asks for map to `None`.
pub fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
        WinitKey::Named(NamedKey::Space) => Some(Key::Space),
        WinitKey::Named(NamedKey::Enter) => Some(Key::Enter),
        WinitKey::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(' '), None) => Some(Key::Space),
                (Some(c), None) => c.to_lowercase().next().map(Key::Char),
                _ => None,
            }
        }
        _ => None,
    }
}
