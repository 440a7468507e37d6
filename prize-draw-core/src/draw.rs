//! Weighted prize draw against finite stock.
//!
//! The draw is a pure function of its inputs plus one call to an injected
//! [`RandomSource`]; callers keep ownership of inventory and weights.
use rand::Rng;

use crate::config::DrawConfig;
use crate::constants::LOSE_SENTINEL;
use crate::odds::weighted_prizes;
use crate::prize_map::{Inventory, Weights};

/// Source of uniform reals in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of unit values, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`; an empty list always yields 0.
#[derive(Debug, Clone, Default)]
pub struct UnitSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl UnitSequence {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: 0,
        }
    }
}

impl RandomSource for UnitSequence {
    fn next_unit(&mut self) -> f64 {
        let Some(value) = self.values.get(self.cursor % self.values.len().max(1)).copied() else {
            return 0.0;
        };
        self.cursor = self.cursor.wrapping_add(1);
        if value.is_finite() {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        }
    }
}

/// Result of one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub prize: String,
    /// Inventory after the award; identical to the input unless the chosen
    /// prize had stock.
    pub remaining: Inventory,
}

/// Draw one prize.
///
/// - No stock at all: the lose sentinel, inventory untouched.
/// - Positive total weight: cumulative sampling in inventory order; rounding
///   that overshoots every bucket falls back to the last prize.
/// - Zero total weight: the first prize with stock.
///
/// The chosen prize loses exactly one unit if it had any.
pub fn draw<R: RandomSource + ?Sized>(
    inventory: &Inventory,
    weights: &Weights,
    visits: u32,
    config: &DrawConfig,
    rng: &mut R,
) -> DrawOutcome {
    let mut remaining = inventory.clone();
    if inventory.total() == 0 {
        log::debug!("draw on empty inventory, awarding {LOSE_SENTINEL}");
        return DrawOutcome {
            prize: LOSE_SENTINEL.to_string(),
            remaining,
        };
    }

    let multiplier = config.multiplier(visits);
    let entries = weighted_prizes(inventory, weights, multiplier, &config.targets);
    let total: f64 = entries.iter().map(|entry| entry.weight).sum();

    let chosen = if total > 0.0 {
        let target = rng.next_unit() * total;
        let mut acc = 0.0;
        entries
            .iter()
            .find(|entry| {
                acc += entry.weight;
                target < acc
            })
            .or_else(|| {
                log::debug!("cumulative weight {acc} fell short of {target}, using last prize");
                entries.last()
            })
            .map_or(LOSE_SENTINEL, |entry| entry.name)
    } else {
        entries
            .iter()
            .find(|entry| entry.stock > 0)
            .map_or(LOSE_SENTINEL, |entry| entry.name)
    }
    .to_string();

    if let Some(stock) = remaining.get_mut(&chosen)
        && *stock > 0
    {
        *stock -= 1;
    }

    log::debug!("drew {chosen} (visits={visits}, multiplier={multiplier:.3}, total={total:.3})");
    DrawOutcome {
        prize: chosen,
        remaining,
    }
}
