//! Browser-backed slots for the session records.
//!
//! Draw counts live in a first-party cookie so they survive a cleared
//! `localStorage`; every other record lives in `localStorage`.
use prize_draw_core::store::{Slot, StoreError, StoreKey};
use prize_draw_core::session::SessionStores;
use js_sys::{decode_uri_component, encode_uri_component};
use wasm_bindgen::JsValue;

use crate::cookie::{COOKIE_MAX_AGE_SECS, cookie_string, expired_cookie, find_cookie};
use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Cookie error: {0}")]
    Cookie(String),
}

impl WebStorageError {
    fn storage(value: &JsValue) -> Self {
        Self::Storage(dom::js_error_message(value))
    }

    fn cookie(value: &JsValue) -> Self {
        Self::Cookie(dom::js_error_message(value))
    }
}

impl From<WebStorageError> for StoreError {
    fn from(err: WebStorageError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// One `localStorage` key.
#[derive(Debug, Clone)]
pub struct LocalStorageSlot {
    key: String,
}

impl LocalStorageSlot {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, WebStorageError> {
        dom::local_storage().map_err(|err| WebStorageError::storage(&err))
    }
}

impl Slot for LocalStorageSlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(Self::storage()?
            .get_item(&self.key)
            .map_err(|err| WebStorageError::storage(&err))?)
    }

    fn set(&self, raw: &str) -> Result<(), StoreError> {
        Ok(Self::storage()?
            .set_item(&self.key, raw)
            .map_err(|err| WebStorageError::storage(&err))?)
    }

    fn remove(&self) -> Result<(), StoreError> {
        Ok(Self::storage()?
            .remove_item(&self.key)
            .map_err(|err| WebStorageError::storage(&err))?)
    }
}

/// One first-party cookie, kept for [`COOKIE_MAX_AGE_SECS`].
#[derive(Debug, Clone)]
pub struct CookieSlot {
    name: String,
    max_age_secs: u64,
}

impl CookieSlot {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_age_secs: COOKIE_MAX_AGE_SECS,
        }
    }

    fn document() -> Result<web_sys::HtmlDocument, WebStorageError> {
        dom::html_document().ok_or_else(|| WebStorageError::Cookie("document unavailable".into()))
    }

    fn encoded_name(&self) -> String {
        encode_uri_component(&self.name).into()
    }
}

impl Slot for CookieSlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        let jar = Self::document()?
            .cookie()
            .map_err(|err| WebStorageError::cookie(&err))?;
        // A value that fails to decode is treated as absent.
        Ok(find_cookie(&jar, &self.encoded_name())
            .and_then(|value| decode_uri_component(value).ok())
            .map(String::from))
    }

    fn set(&self, raw: &str) -> Result<(), StoreError> {
        let value = String::from(encode_uri_component(raw));
        let assignment = cookie_string(&self.encoded_name(), &value, self.max_age_secs);
        Ok(Self::document()?
            .set_cookie(&assignment)
            .map_err(|err| WebStorageError::cookie(&err))?)
    }

    fn remove(&self) -> Result<(), StoreError> {
        Ok(Self::document()?
            .set_cookie(&expired_cookie(&self.encoded_name()))
            .map_err(|err| WebStorageError::cookie(&err))?)
    }
}

/// Slot used for a record in the browser.
#[must_use]
pub fn browser_slot(key: StoreKey) -> Box<dyn Slot> {
    match key {
        StoreKey::DrawCounts => Box::new(CookieSlot::new(key.as_str())),
        _ => Box::new(LocalStorageSlot::new(key.as_str())),
    }
}

/// Session stores over the browser's cookie jar and `localStorage`.
#[must_use]
pub fn browser_stores() -> SessionStores {
    SessionStores::from_slots(browser_slot)
}
