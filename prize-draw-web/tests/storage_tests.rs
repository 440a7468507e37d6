#![cfg(target_arch = "wasm32")]

use prize_draw_core::store::{Slot, StoreKey};
use prize_draw_core::{DrawSession, SessionOptions, UnitSequence};
use prize_draw_web::storage::browser_slot;
use prize_draw_web::{CookieSlot, LocalStorageSlot, browser_stores, dom};
use wasm_bindgen_test::*;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn clear_all() {
    for key in StoreKey::ALL {
        browser_slot(key).remove().expect("clear slot");
    }
}

#[wasm_bindgen_test]
fn dom_helpers_find_browser_context() {
    assert!(dom::window().is_some());
    assert!(dom::html_document().is_some());
    assert!(dom::local_storage().is_ok());
}

#[wasm_bindgen_test]
fn local_storage_slot_roundtrips() {
    let slot = LocalStorageSlot::new("prize-draw.test.slot");
    slot.set(r#"{"A":1}"#).expect("set");
    assert_eq!(slot.get().expect("get").as_deref(), Some(r#"{"A":1}"#));
    slot.remove().expect("remove");
    assert_eq!(slot.get().expect("get"), None);
}

#[wasm_bindgen_test]
fn cookie_slot_roundtrips_japanese_json() {
    let slot = CookieSlot::new("prize-draw-test");
    slot.set(r#"{"大当たり":2}"#).expect("set");
    assert_eq!(slot.get().expect("get").as_deref(), Some(r#"{"大当たり":2}"#));
    slot.remove().expect("remove");
    assert_eq!(slot.get().expect("get"), None);
}

#[wasm_bindgen_test]
fn session_counts_survive_reopen() {
    clear_all();
    let mut session = DrawSession::open(SessionOptions::default(), browser_stores());
    let prize = session.perform_draw(3, &mut UnitSequence::new([0.0]));
    assert_eq!(prize, "大当たり");

    let reopened = DrawSession::open(SessionOptions::default(), browser_stores());
    assert_eq!(reopened.draw_counts().get("大当たり"), 1);
    assert_eq!(reopened.total_stock(), 549);
    clear_all();
}
