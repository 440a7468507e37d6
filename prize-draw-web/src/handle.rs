//! JavaScript-facing kiosk handle.
//!
//! The UI owns rendering and the draw animation; it calls into this handle
//! for every read and mutation of session state.
use prize_draw_core::admin::{parse_name_list, parse_params, parse_stock_delta, replace_weights};
use prize_draw_core::numbers::u64_to_f64;
use prize_draw_core::{
    DrawSession, FlowError, Inventory, PrizeMap, SessionOptions, Weights, visits_from_json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::rng::MathRandom;
use crate::storage::browser_stores;

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than `Map`s so the UI can index by prize name.
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

/// Form fields arrive as numbers or as raw input text.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

fn text_fields(fields: &PrizeMap<Value>) -> Vec<(&str, String)> {
    fields
        .iter()
        .filter_map(|(name, value)| field_text(value).map(|text| (name, text)))
        .collect()
}

fn weights_from_fields(current: &Weights, fields: &PrizeMap<Value>) -> Weights {
    let texts: Vec<(&str, String)> = fields
        .iter()
        .map(|(name, value)| (name, field_text(value).unwrap_or_default()))
        .collect();
    replace_weights(
        current,
        texts.iter().map(|(name, text)| (*name, text.as_str())),
    )
}

#[derive(Debug, Default, Deserialize)]
struct ParamsInput {
    #[serde(rename = "N")]
    threshold: Option<Value>,
    beta: Option<Value>,
    #[serde(rename = "Mcap")]
    mcap: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DrawReport<'a> {
    prize: &'a str,
    /// Position among the gain targets; absent for non-winning prizes.
    rank: Option<usize>,
    inventory: &'a Inventory,
    total_stock: u64,
}

#[wasm_bindgen]
pub struct KioskHandle {
    session: DrawSession,
}

#[wasm_bindgen]
impl KioskHandle {
    /// Open the browser session. `options` may be `undefined` for the event defaults.
    ///
    /// # Errors
    /// Returns an error if `options` is present but not a valid options object.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<Self, JsValue> {
        let options: SessionOptions = if options.is_undefined() || options.is_null() {
            SessionOptions::default()
        } else {
            from_js(options)?
        };
        Ok(Self {
            session: DrawSession::open(options, browser_stores()),
        })
    }

    /// # Errors
    /// Returns an error if the rows cannot be converted to JavaScript values.
    #[wasm_bindgen(js_name = probRows)]
    pub fn prob_rows(&self, visits: u32) -> Result<JsValue, JsValue> {
        to_js(&self.session.prob_rows(visits))
    }

    #[wasm_bindgen(js_name = canDraw)]
    #[must_use]
    pub fn can_draw(&self, visits: u32) -> bool {
        self.session.can_draw(visits)
    }

    #[wasm_bindgen(js_name = eligibilityMessage)]
    #[must_use]
    pub fn eligibility_message(&self, visits: u32) -> String {
        self.session.eligibility(visits).to_string()
    }

    /// Draw for an eligible visitor and return `{ prize, rank, inventory, totalStock }`.
    ///
    /// # Errors
    /// Returns the eligibility message if the visitor may not draw.
    pub fn draw(&mut self, visits: u32) -> Result<JsValue, JsValue> {
        let eligibility = self.session.eligibility(visits);
        if !eligibility.is_eligible() {
            return Err(JsValue::from_str(
                &FlowError::Ineligible(eligibility).to_string(),
            ));
        }
        let prize = self.session.perform_draw(visits, &mut MathRandom);
        to_js(&DrawReport {
            prize: &prize,
            rank: self.session.prize_rank(&prize),
            inventory: self.session.displayed_inventory(),
            total_stock: self.session.total_stock(),
        })
    }

    #[wasm_bindgen(js_name = visitsFromHistory)]
    #[must_use]
    pub fn visits_from_history(&self, json: &str) -> u32 {
        visits_from_json(json)
    }

    /// Apply `{ prize: delta }`; fields that are not numbers are ignored.
    ///
    /// # Errors
    /// Returns an error if `delta` is not an object.
    #[wasm_bindgen(js_name = addStock)]
    pub fn add_stock(&mut self, delta: JsValue) -> Result<(), JsValue> {
        let fields: PrizeMap<Value> = from_js(delta)?;
        let texts = text_fields(&fields);
        let delta = parse_stock_delta(texts.iter().map(|(name, text)| (*name, text.as_str())));
        self.session.add_stock(&delta);
        Ok(())
    }

    /// Apply `{ N, beta, Mcap }`; missing or invalid fields keep their value.
    ///
    /// # Errors
    /// Returns an error if `params` is not an object.
    #[wasm_bindgen(js_name = updateParams)]
    pub fn update_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let input: ParamsInput = from_js(params)?;
        let text = |field: &Option<Value>| field.as_ref().and_then(field_text).unwrap_or_default();
        let patch = parse_params(&text(&input.threshold), &text(&input.beta), &text(&input.mcap));
        if !patch.is_empty() {
            self.session.update_params(patch);
        }
        Ok(())
    }

    /// Replace the weights with `{ prize: weight }`. Prizes left out weigh zero;
    /// a field that is not a number keeps its current weight.
    ///
    /// # Errors
    /// Returns an error if `weights` is not an object.
    #[wasm_bindgen(js_name = updateWeights)]
    pub fn update_weights(&mut self, weights: JsValue) -> Result<(), JsValue> {
        let fields: PrizeMap<Value> = from_js(weights)?;
        let next = weights_from_fields(self.session.weights(), &fields);
        self.session.update_weights(next);
        Ok(())
    }

    /// Replace the targets from comma-separated prize names.
    #[wasm_bindgen(js_name = updateTargets)]
    pub fn update_targets(&mut self, gain_targets: &str, lose_names: &str) {
        self.session
            .update_targets(parse_name_list(gain_targets), parse_name_list(lose_names));
    }

    #[wasm_bindgen(js_name = resetAll)]
    pub fn reset_all(&mut self) {
        self.session.reset_all();
    }

    pub fn sync(&mut self) {
        self.session.sync();
    }

    /// # Errors
    /// Returns an error if the inventory cannot be converted to a JavaScript value.
    pub fn inventory(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.displayed_inventory())
    }

    #[wasm_bindgen(js_name = totalStock)]
    #[must_use]
    pub fn total_stock(&self) -> f64 {
        u64_to_f64(self.session.total_stock())
    }
}
