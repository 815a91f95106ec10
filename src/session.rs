// Tab-scoped key/value flags that survive page changes and reloads.
use std::collections::HashMap;
use std::sync::Mutex;

use bevy::prelude::*;
use thiserror::Error;

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<Session>() {
            app.insert_resource(Session::platform_default());
        }

        #[cfg(debug_assertions)]
        app.add_systems(Update, debug_reset_session);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("session storage is not available")]
    Unavailable,
    #[error("session storage access failed: {0}")]
    Access(String),
}

/// Raw string storage scoped to the current browser tab.
pub trait SessionStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-process store, used on native builds and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Access(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Access(e.to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Access(e.to_string()))?;
        entries.clear();
        Ok(())
    }
}

/// Stands in for a host that has storage disabled.
pub struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlag {
    HasSeenIntro,
    AudioEnabled,
}

impl SessionFlag {
    pub const fn key(self) -> &'static str {
        match self {
            SessionFlag::HasSeenIntro => "hasSeenIntro",
            SessionFlag::AudioEnabled => "background_music_state",
        }
    }

    /// Stored (true, false) spellings.
    const fn spellings(self) -> (&'static str, &'static str) {
        match self {
            SessionFlag::HasSeenIntro => ("true", "false"),
            SessionFlag::AudioEnabled => ("playing", "paused"),
        }
    }

    pub fn encode(self, value: bool) -> &'static str {
        let (on, off) = self.spellings();
        if value { on } else { off }
    }

    pub fn decode(self, raw: &str) -> Option<bool> {
        let (on, off) = self.spellings();
        if raw == on {
            Some(true)
        } else if raw == off {
            Some(false)
        } else {
            None
        }
    }
}

/// Typed flag access over whatever store the host provides.
///
/// Storage failures never escape: reads degrade to "absent" and writes are
/// dropped, both with a warning, so a host with storage disabled behaves like
/// a fresh session on every visit.
#[derive(Resource)]
pub struct Session {
    store: Box<dyn SessionStore>,
}

impl Session {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    #[cfg(target_arch = "wasm32")]
    pub fn platform_default() -> Self {
        Self::new(crate::web::BrowserSessionStorage)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn platform_default() -> Self {
        Self::in_memory()
    }

    pub fn get(&self, flag: SessionFlag) -> Option<bool> {
        match self.store.read(flag.key()) {
            Ok(Some(raw)) => {
                let value = flag.decode(&raw);
                if value.is_none() {
                    debug!("ignoring unrecognised value {raw:?} for {}", flag.key());
                }
                value
            }
            Ok(None) => None,
            Err(err) => {
                warn!("reading {}: {err}", flag.key());
                None
            }
        }
    }

    /// Absent counts as `false`.
    pub fn is_enabled(&self, flag: SessionFlag) -> bool {
        self.get(flag).unwrap_or(false)
    }

    pub fn set(&self, flag: SessionFlag, value: bool) {
        if let Err(err) = self.store.write(flag.key(), flag.encode(value)) {
            warn!("writing {}: {err}", flag.key());
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            warn!("clearing session: {err}");
        }
    }
}

#[cfg(debug_assertions)]
fn debug_reset_session(keyboard: Res<ButtonInput<KeyCode>>, session: Res<Session>) {
    if keyboard.just_pressed(KeyCode::F9) {
        session.clear();
        info!("session cleared, intro will play on next landing visit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_flag_reads_none() {
        let session = Session::in_memory();
        assert_eq!(session.get(SessionFlag::HasSeenIntro), None);
        assert!(!session.is_enabled(SessionFlag::HasSeenIntro));
    }

    #[test]
    fn test_flags_use_their_own_spellings() {
        let store = MemoryStore::default();
        store.write("background_music_state", "paused").unwrap();
        store.write("hasSeenIntro", "true").unwrap();
        let session = Session::new(store);
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));
        assert_eq!(session.get(SessionFlag::HasSeenIntro), Some(true));

        session.set(SessionFlag::AudioEnabled, true);
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(true));
        assert_eq!(SessionFlag::AudioEnabled.encode(true), "playing");
        assert_eq!(SessionFlag::HasSeenIntro.encode(false), "false");
    }

    #[test]
    fn test_unknown_value_reads_as_absent() {
        let store = MemoryStore::default();
        store.write("hasSeenIntro", "yes please").unwrap();
        let session = Session::new(store);
        assert_eq!(session.get(SessionFlag::HasSeenIntro), None);
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let session = Session::new(UnavailableStore);
        session.set(SessionFlag::HasSeenIntro, true);
        assert_eq!(session.get(SessionFlag::HasSeenIntro), None);
        session.clear();
    }

    #[test]
    fn test_clear_forgets_everything() {
        let session = Session::in_memory();
        session.set(SessionFlag::HasSeenIntro, true);
        session.set(SessionFlag::AudioEnabled, true);
        session.clear();
        assert_eq!(session.get(SessionFlag::HasSeenIntro), None);
        assert_eq!(session.get(SessionFlag::AudioEnabled), None);
    }
}
