//! Draw configuration: boost parameters, prize targets and session options.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BETA, DEFAULT_GAIN_TARGETS, DEFAULT_INITIAL_STOCK, DEFAULT_LOSE_NAMES, DEFAULT_MCAP,
    DEFAULT_THRESHOLD, DEFAULT_WEIGHT,
};
use crate::prize_map::{Inventory, Weights};

/// Visit-driven boost tuning. Persisted as `{ "N", "beta", "Mcap" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostParams {
    /// Visits required before a draw is allowed.
    #[serde(rename = "N")]
    pub threshold: u32,
    /// Multiplier growth per visit beyond the threshold.
    pub beta: f64,
    /// Multiplier ceiling. Values below 1 collapse the multiplier to 1.
    #[serde(rename = "Mcap")]
    pub mcap: f64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            beta: DEFAULT_BETA,
            mcap: DEFAULT_MCAP,
        }
    }
}

impl BoostParams {
    /// `m = clamp(1, Mcap, 1 + beta * max(0, visits - N))`.
    ///
    /// The lower bound wins when `Mcap < 1`, so the multiplier never drops
    /// below 1.
    #[must_use]
    pub fn multiplier(&self, visits: u32) -> f64 {
        let excess = visits.saturating_sub(self.threshold);
        let raw = 1.0 + self.beta * f64::from(excess);
        raw.min(self.mcap).max(1.0)
    }
}

/// Partial update of [`BoostParams`]; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamsPatch {
    pub threshold: Option<u32>,
    pub beta: Option<f64>,
    pub mcap: Option<f64>,
}

impl ParamsPatch {
    /// Apply the patch. Non-finite reals are ignored like any other invalid input.
    #[must_use]
    pub fn apply(&self, current: BoostParams) -> BoostParams {
        BoostParams {
            threshold: self.threshold.unwrap_or(current.threshold),
            beta: self.beta.filter(|v| v.is_finite()).unwrap_or(current.beta),
            mcap: self.mcap.filter(|v| v.is_finite()).unwrap_or(current.mcap),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threshold.is_none() && self.beta.is_none() && self.mcap.is_none()
    }
}

/// Which prizes receive the boost and which represent a non-win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrizeTargets {
    /// Boosted prizes, ordered from top prize down.
    pub gain_targets: Vec<String>,
    pub lose_names: Vec<String>,
}

impl Default for PrizeTargets {
    fn default() -> Self {
        Self {
            gain_targets: DEFAULT_GAIN_TARGETS.iter().map(ToString::to_string).collect(),
            lose_names: DEFAULT_LOSE_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PrizeTargets {
    #[must_use]
    pub fn is_gain(&self, prize: &str) -> bool {
        self.gain_targets.iter().any(|name| name == prize)
    }

    #[must_use]
    pub fn is_lose(&self, prize: &str) -> bool {
        self.lose_names.iter().any(|name| name == prize)
    }

    /// Position among the gain targets, 0 being the top prize.
    #[must_use]
    pub fn rank(&self, prize: &str) -> Option<usize> {
        self.gain_targets.iter().position(|name| name == prize)
    }
}

/// Everything the engine needs besides inventory and weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub params: BoostParams,
    pub targets: PrizeTargets,
}

impl DrawConfig {
    #[must_use]
    pub fn multiplier(&self, visits: u32) -> f64 {
        self.params.multiplier(visits)
    }
}

/// Startup configuration for a session. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    /// Stock restored by a full reset and used when nothing is persisted.
    pub initial_stock: Inventory,
    pub weights: Weights,
    #[serde(flatten)]
    pub params: BoostParams,
    #[serde(flatten)]
    pub targets: PrizeTargets,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_stock: DEFAULT_INITIAL_STOCK.into_iter().collect(),
            weights: DEFAULT_INITIAL_STOCK
                .iter()
                .map(|(name, _)| (*name, DEFAULT_WEIGHT))
                .collect(),
            params: BoostParams::default(),
            targets: PrizeTargets::default(),
        }
    }
}

impl SessionOptions {
    /// Load options from JSON; absent fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn draw_config(&self) -> DrawConfig {
        DrawConfig {
            params: self.params,
            targets: self.targets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_is_capped_and_floored() {
        let params = BoostParams {
            threshold: 3,
            beta: 0.15,
            mcap: 2.0,
        };
        assert!((params.multiplier(0) - 1.0).abs() < 1e-12);
        assert!((params.multiplier(3) - 1.0).abs() < 1e-12);
        assert!((params.multiplier(5) - 1.3).abs() < 1e-12);
        assert!((params.multiplier(10) - 2.0).abs() < 1e-12);
        assert!((params.multiplier(u32::MAX) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn mcap_below_one_collapses_to_one() {
        let params = BoostParams {
            threshold: 0,
            beta: 1.0,
            mcap: 0.5,
        };
        assert!((params.multiplier(0) - 1.0).abs() < 1e-12);
        assert!((params.multiplier(50) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn params_use_legacy_json_keys() {
        let params: BoostParams = serde_json::from_str(r#"{"N":5,"beta":0.2}"#).unwrap();
        assert_eq!(params.threshold, 5);
        assert!((params.beta - 0.2).abs() < 1e-12);
        assert!((params.mcap - DEFAULT_MCAP).abs() < 1e-12);
        let json = serde_json::to_string(&BoostParams::default()).unwrap();
        assert_eq!(json, r#"{"N":3,"beta":0.15,"Mcap":2.0}"#);
    }

    #[test]
    fn patch_keeps_missing_and_non_finite_fields() {
        let patch = ParamsPatch {
            threshold: Some(1),
            beta: Some(f64::NAN),
            mcap: None,
        };
        let next = patch.apply(BoostParams::default());
        assert_eq!(next.threshold, 1);
        assert!((next.beta - DEFAULT_BETA).abs() < 1e-12);
        assert!((next.mcap - DEFAULT_MCAP).abs() < 1e-12);
        assert!(ParamsPatch::default().is_empty());
    }

    #[test]
    fn targets_rank_from_top_prize() {
        let targets = PrizeTargets::default();
        assert_eq!(targets.rank("大当たり"), Some(0));
        assert_eq!(targets.rank("小当たり"), Some(2));
        assert_eq!(targets.rank("はずれ"), None);
        assert!(targets.is_lose("はずれ"));
        assert!(!targets.is_gain("はずれ"));
    }

    #[test]
    fn default_options_match_event_setup() {
        let options = SessionOptions::default();
        let keys: Vec<&str> = options.initial_stock.keys().collect();
        assert_eq!(keys, ["大当たり", "中当たり", "小当たり", "はずれ"]);
        assert_eq!(options.initial_stock.total(), 550);
        assert_eq!(options.weights.len(), 4);
    }

    #[test]
    fn options_json_is_partial() {
        let options =
            SessionOptions::from_json(r#"{"initialStock":{"A":1,"B":2},"N":0,"gainTargets":["A"]}"#)
                .unwrap();
        assert_eq!(options.initial_stock.total(), 3);
        assert_eq!(options.params.threshold, 0);
        assert!((options.params.beta - DEFAULT_BETA).abs() < 1e-12);
        assert_eq!(options.targets.gain_targets, ["A"]);
        assert_eq!(options.targets.lose_names, ["はずれ"]);
    }
}
