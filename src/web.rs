// Browser capabilities, wasm32 only.
use bevy::prelude::*;
use wasm_bindgen::JsValue;

use crate::session::{SessionStore, StorageError};

/// `window.sessionStorage`, looked up on every access so the handle is never
/// held across frames.
pub struct BrowserSessionStorage;

fn session_storage() -> Result<web_sys::Storage, StorageError> {
    let window = web_sys::window().ok_or(StorageError::Unavailable)?;
    window
        .session_storage()
        .map_err(|e| StorageError::Access(format!("{e:?}")))?
        .ok_or(StorageError::Unavailable)
}

impl SessionStore for BrowserSessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        session_storage()?
            .get_item(key)
            .map_err(|e| StorageError::Access(format!("{e:?}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        session_storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Access(format!("{e:?}")))
    }

    fn clear(&self) -> Result<(), StorageError> {
        session_storage()?
            .clear()
            .map_err(|e| StorageError::Access(format!("{e:?}")))
    }
}

pub fn current_route() -> Option<String> {
    web_sys::window()?.location().pathname().ok()
}

/// Reflect the current page in the address bar.
pub fn push_route(route: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    if let Err(e) = history.push_state_with_url(&JsValue::NULL, "", Some(route)) {
        warn!("pushState to {route} failed: {e:?}");
    }
}
