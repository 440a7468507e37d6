#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod cookie;
pub mod dom;
pub mod handle;
pub mod rng;
pub mod storage;

pub use handle::KioskHandle;
pub use rng::MathRandom;
pub use storage::{CookieSlot, LocalStorageSlot, WebStorageError, browser_stores};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    log::debug!("prize draw kiosk module loaded");
}
