//! Probability table for display.
use serde::{Deserialize, Serialize};

use crate::config::{DrawConfig, PrizeTargets};
use crate::numbers::usize_to_f64;
use crate::prize_map::{Inventory, Weights};

/// One row of the odds table shown to visitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbRow {
    pub prize: String,
    pub stock: u32,
    /// Percentage in `0..=100`.
    #[serde(rename = "prob")]
    pub probability: f64,
}

/// A prize with its effective draw weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WeightedPrize<'a> {
    pub name: &'a str,
    pub stock: u32,
    pub weight: f64,
}

/// Effective weight per prize in inventory order: `weight * stock`, times the
/// boost multiplier for gain targets. Out-of-stock prizes weigh zero.
///
/// Weights are taken relative to the largest stocked weight and each effective
/// weight is capped at `f64::MAX / len`, so the total is always finite.
pub(crate) fn weighted_prizes<'a>(
    inventory: &'a Inventory,
    weights: &Weights,
    multiplier: f64,
    targets: &PrizeTargets,
) -> Vec<WeightedPrize<'a>> {
    let top = inventory
        .iter()
        .filter(|(_, stock)| **stock > 0)
        .map(|(name, _)| weights.weight_of(name))
        .fold(0.0, f64::max);
    let ceiling = f64::MAX / usize_to_f64(inventory.len().max(1));

    inventory
        .iter()
        .map(|(name, &stock)| {
            let base = if stock > 0 && top > 0.0 {
                weights.weight_of(name) / top * f64::from(stock)
            } else {
                0.0
            };
            let weight = if targets.is_gain(name) {
                base * multiplier
            } else {
                base
            }
            .min(ceiling);
            WeightedPrize {
                name,
                stock,
                weight,
            }
        })
        .collect()
}

/// Compute the probability table, one row per inventory key in inventory order.
///
/// Probabilities sum to 100 whenever any prize has positive effective weight;
/// otherwise every row is 0.
#[must_use]
pub fn compute_probs(
    inventory: &Inventory,
    weights: &Weights,
    visits: u32,
    config: &DrawConfig,
) -> Vec<ProbRow> {
    let zeroed = || {
        inventory
            .iter()
            .map(|(name, &stock)| ProbRow {
                prize: name.to_string(),
                stock,
                probability: 0.0,
            })
            .collect()
    };

    if inventory.total() == 0 {
        return zeroed();
    }

    let entries = weighted_prizes(
        inventory,
        weights,
        config.multiplier(visits),
        &config.targets,
    );
    let sum: f64 = entries.iter().map(|entry| entry.weight).sum();
    if sum <= 0.0 {
        return zeroed();
    }

    entries
        .into_iter()
        .map(|entry| ProbRow {
            prize: entry.name.to_string(),
            stock: entry.stock,
            probability: entry.weight / sum * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoostParams;

    fn flat_config(threshold: u32) -> DrawConfig {
        DrawConfig {
            params: BoostParams {
                threshold,
                beta: 0.15,
                mcap: 2.0,
            },
            targets: PrizeTargets {
                gain_targets: Vec::new(),
                lose_names: Vec::new(),
            },
        }
    }

    fn prob_of(rows: &[ProbRow], prize: &str) -> f64 {
        rows.iter()
            .find(|row| row.prize == prize)
            .map_or(f64::NAN, |row| row.probability)
    }

    #[test]
    fn equal_stock_and_weight_split_evenly() {
        let inv: Inventory = [("A", 1), ("B", 1)].into_iter().collect();
        let weights: Weights = [("A", 1.0), ("B", 1.0)].into_iter().collect();
        let rows = compute_probs(&inv, &weights, 0, &flat_config(0));
        assert!((prob_of(&rows, "A") - 50.0).abs() < 1e-9);
        assert!((prob_of(&rows, "B") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_prize_gets_zero_and_rest_gets_all() {
        let inv: Inventory = [("A", 0), ("B", 1)].into_iter().collect();
        let weights: Weights = [("A", 1.0), ("B", 1.0)].into_iter().collect();
        let rows = compute_probs(&inv, &weights, 0, &flat_config(0));
        assert!(prob_of(&rows, "A").abs() < 1e-12);
        assert!((prob_of(&rows, "B") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn no_stock_reports_stock_with_zero_odds() {
        let inv: Inventory = [("A", 0), ("B", 0)].into_iter().collect();
        let weights: Weights = [("A", 1.0), ("B", 1.0)].into_iter().collect();
        let rows = compute_probs(&inv, &weights, 9, &flat_config(0));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.probability == 0.0));
    }

    #[test]
    fn zero_weights_yield_zero_odds() {
        let inv: Inventory = [("A", 4), ("B", 2)].into_iter().collect();
        let weights: Weights = [("A", 0.0)].into_iter().collect();
        let rows = compute_probs(&inv, &weights, 0, &flat_config(0));
        assert!(rows.iter().all(|row| row.probability == 0.0));
        assert_eq!(rows[0].stock, 4);
    }

    #[test]
    fn boost_applies_to_gain_targets_only() {
        let inv: Inventory = [("win", 1), ("lose", 1)].into_iter().collect();
        let weights: Weights = [("win", 1.0), ("lose", 1.0)].into_iter().collect();
        let mut config = flat_config(3);
        config.targets.gain_targets = vec!["win".into()];
        config.targets.lose_names = vec!["lose".into()];

        // visits=10 -> m = 2.0, win weighs 2 against 1.
        let rows = compute_probs(&inv, &weights, 10, &config);
        assert!((prob_of(&rows, "win") - 200.0 / 3.0).abs() < 1e-9);
        assert!((prob_of(&rows, "lose") - 100.0 / 3.0).abs() < 1e-9);

        let unboosted = compute_probs(&inv, &weights, 2, &config);
        assert!((prob_of(&unboosted, "win") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_weights_stay_normalized() {
        let inv: Inventory = [("A", 2), ("B", 1)].into_iter().collect();
        let weights: Weights = [("A", f64::MAX), ("B", 1.0)].into_iter().collect();
        let rows = compute_probs(&inv, &weights, 0, &flat_config(0));
        assert!(rows.iter().all(|row| row.probability.is_finite() && row.probability >= 0.0));
        let sum: f64 = rows.iter().map(|row| row.probability).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((prob_of(&rows, "A") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_boost_stays_normalized() {
        let inv: Inventory = [("win", 4_000_000_000), ("lose", 3)].into_iter().collect();
        let weights: Weights = [("win", 1e300), ("lose", 1e300)].into_iter().collect();
        let mut config = flat_config(0);
        config.params.beta = 1e308;
        config.params.mcap = f64::MAX;
        config.targets.gain_targets = vec!["win".into()];
        let rows = compute_probs(&inv, &weights, 10, &config);
        let sum: f64 = rows.iter().map(|row| row.probability).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!(prob_of(&rows, "win") > prob_of(&rows, "lose"));
    }

    #[test]
    fn rows_follow_inventory_order() {
        let inv: Inventory = [("c", 1), ("a", 1), ("b", 1)].into_iter().collect();
        let rows = compute_probs(&inv, &Weights::new(), 0, &flat_config(0));
        let names: Vec<&str> = rows.iter().map(|row| row.prize.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn row_serializes_prob_field() {
        let row = ProbRow {
            prize: "A".into(),
            stock: 2,
            probability: 50.0,
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"prize":"A","stock":2,"prob":50.0}"#
        );
    }
}
