//! `document.cookie` assignment and lookup strings.
//!
//! Names and values are passed in already URI-encoded; the slot encodes them
//! with `js_sys`. Nothing here touches the DOM, so it is tested natively.

/// Draw counts survive a year on the kiosk browser.
pub const COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// Assignment string for `document.cookie`.
#[must_use]
pub fn cookie_string(encoded_name: &str, encoded_value: &str, max_age_secs: u64) -> String {
    format!("{encoded_name}={encoded_value}; max-age={max_age_secs}; path=/; SameSite=Lax")
}

/// Assignment that deletes the cookie.
#[must_use]
pub fn expired_cookie(encoded_name: &str) -> String {
    format!("{encoded_name}=; max-age=0; path=/; SameSite=Lax")
}

/// Find one cookie's still-encoded value in a `document.cookie` string.
#[must_use]
pub fn find_cookie<'a>(cookies: &'a str, encoded_name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == encoded_name).then(|| value.trim())
    })
}
