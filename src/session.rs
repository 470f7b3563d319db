use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore;

use crate::llm::BackendMode;

/// Generate an opaque session identity: 16 random bytes, hex-encoded.
pub fn new_identity() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Per-session backend selection. Unknown identities resolve to the
/// default mode; selections never expire.
pub struct SessionStore {
    modes: Mutex<HashMap<String, BackendMode>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            modes: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self, identity: &str) -> BackendMode {
        self.modes
            .lock()
            .unwrap()
            .get(identity)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_mode(&self, identity: &str, mode: BackendMode) {
        self.modes.lock().unwrap().insert(identity.to_string(), mode);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_32_hex_chars_and_unique() {
        let a = new_identity();
        let b = new_identity();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_identity_gets_default_mode() {
        let store = SessionStore::new();
        assert_eq!(store.mode("nobody"), BackendMode::Groq);
    }

    #[test]
    fn set_mode_is_scoped_to_one_identity() {
        let store = SessionStore::new();
        store.set_mode("alice", BackendMode::Local);

        assert_eq!(store.mode("alice"), BackendMode::Local);
        assert_eq!(store.mode("bob"), BackendMode::Groq);
    }
}
