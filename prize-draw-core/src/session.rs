//! Session controller: owns the admin-facing state and keeps the displayed
//! inventory reconciled with the persisted draw counts.
//!
//! Every record is persisted independently and best-effort. There is no
//! transaction across records: if the process dies between a draw and its
//! counter increment, the award is lost from the ledger. That window is
//! accepted for a single-kiosk event.
use std::fmt;

use crate::config::{BoostParams, DrawConfig, ParamsPatch, PrizeTargets, SessionOptions};
use crate::counts::{CounterStore, DrawCounts, apply_counts};
use crate::draw::{RandomSource, draw};
use crate::numbers::clamp_i64_to_u32;
use crate::odds::{ProbRow, compute_probs};
use crate::prize_map::{Inventory, PrizeMap, Weights};
use crate::store::{JsonStore, MemoryStore, Slot, Store, StoreKey};

/// The injected durable records a session works against.
pub struct SessionStores {
    pub counts: Box<dyn Store<DrawCounts>>,
    pub base_stock: Box<dyn Store<Inventory>>,
    pub params: Box<dyn Store<BoostParams>>,
    pub weights: Box<dyn Store<Weights>>,
    pub targets: Box<dyn Store<PrizeTargets>>,
}

impl SessionStores {
    /// Volatile stores, for tests and demos.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            counts: Box::new(MemoryStore::<DrawCounts>::new()),
            base_stock: Box::new(MemoryStore::<Inventory>::new()),
            params: Box::new(MemoryStore::<BoostParams>::new()),
            weights: Box::new(MemoryStore::<Weights>::new()),
            targets: Box::new(MemoryStore::<PrizeTargets>::new()),
        }
    }

    /// JSON records over raw slots, one slot per [`StoreKey`].
    pub fn from_slots<F>(mut open: F) -> Self
    where
        F: FnMut(StoreKey) -> Box<dyn Slot>,
    {
        Self {
            counts: Box::new(JsonStore::<_, DrawCounts>::new(open(StoreKey::DrawCounts))),
            base_stock: Box::new(JsonStore::<_, Inventory>::new(open(StoreKey::BaseStock))),
            params: Box::new(JsonStore::<_, BoostParams>::new(open(StoreKey::Params))),
            weights: Box::new(JsonStore::<_, Weights>::new(open(StoreKey::Weights))),
            targets: Box::new(JsonStore::<_, PrizeTargets>::new(open(StoreKey::Targets))),
        }
    }
}

impl fmt::Debug for SessionStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStores").finish_non_exhaustive()
    }
}

/// Whether a visitor may draw right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// More visits are needed before drawing.
    NeedsVisits { remaining: u32 },
    /// Every prize has been claimed.
    OutOfStock,
}

impl Eligibility {
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("抽選する"),
            Self::NeedsVisits { remaining } => {
                write!(f, "抽選はできません（あと {remaining} 回）")
            }
            Self::OutOfStock => f.write_str("在庫がありません"),
        }
    }
}

fn load_or<T>(store: &dyn Store<T>, key: StoreKey, fallback: impl FnOnce() -> T) -> T {
    match store.read() {
        Ok(Some(value)) => value,
        Ok(None) => fallback(),
        Err(err) => {
            log::warn!("{} unreadable, using defaults: {err}", key.as_str());
            fallback()
        }
    }
}

fn persist<T>(store: &dyn Store<T>, key: StoreKey, value: &T) {
    if let Err(err) = store.write(value) {
        log::warn!("failed to persist {}: {err}", key.as_str());
    }
}

/// Orchestrates draws and admin edits over the persisted records.
pub struct DrawSession {
    counter: CounterStore,
    base_store: Box<dyn Store<Inventory>>,
    params_store: Box<dyn Store<BoostParams>>,
    weights_store: Box<dyn Store<Weights>>,
    targets_store: Box<dyn Store<PrizeTargets>>,
    initial_stock: Inventory,
    base_stock: Inventory,
    weights: Weights,
    config: DrawConfig,
    displayed: Inventory,
}

impl DrawSession {
    /// Open a session, restoring persisted records and falling back to
    /// `options` for anything missing or unreadable.
    #[must_use]
    pub fn open(options: SessionOptions, stores: SessionStores) -> Self {
        let SessionStores {
            counts,
            base_stock: base_store,
            params: params_store,
            weights: weights_store,
            targets: targets_store,
        } = stores;

        let base_stock = load_or(base_store.as_ref(), StoreKey::BaseStock, || {
            options.initial_stock.clone()
        });
        let params = load_or(params_store.as_ref(), StoreKey::Params, || options.params);
        let weights = load_or(weights_store.as_ref(), StoreKey::Weights, || {
            options.weights.clone()
        });
        let targets = load_or(targets_store.as_ref(), StoreKey::Targets, || {
            options.targets.clone()
        });

        let counter = CounterStore::new(counts);
        let displayed = apply_counts(&base_stock, &counter.read());

        Self {
            counter,
            base_store,
            params_store,
            weights_store,
            targets_store,
            initial_stock: options.initial_stock,
            base_stock,
            weights,
            config: DrawConfig { params, targets },
            displayed,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DrawConfig {
        &self.config
    }

    #[must_use]
    pub const fn weights(&self) -> &Weights {
        &self.weights
    }

    #[must_use]
    pub const fn base_stock(&self) -> &Inventory {
        &self.base_stock
    }

    #[must_use]
    pub const fn initial_stock(&self) -> &Inventory {
        &self.initial_stock
    }

    /// Base stock minus the persisted draw counts.
    #[must_use]
    pub const fn displayed_inventory(&self) -> &Inventory {
        &self.displayed
    }

    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.displayed.total()
    }

    /// Current ledger as persisted.
    #[must_use]
    pub fn draw_counts(&self) -> DrawCounts {
        self.counter.read()
    }

    #[must_use]
    pub fn prob_rows(&self, visits: u32) -> Vec<ProbRow> {
        compute_probs(&self.displayed, &self.weights, visits, &self.config)
    }

    #[must_use]
    pub fn can_draw(&self, visits: u32) -> bool {
        visits >= self.config.params.threshold && self.total_stock() > 0
    }

    #[must_use]
    pub fn eligibility(&self, visits: u32) -> Eligibility {
        if self.total_stock() == 0 {
            Eligibility::OutOfStock
        } else if visits < self.config.params.threshold {
            Eligibility::NeedsVisits {
                remaining: self.config.params.threshold - visits,
            }
        } else {
            Eligibility::Eligible
        }
    }

    /// Rank among the gain targets, 0 being the top prize.
    #[must_use]
    pub fn prize_rank(&self, prize: &str) -> Option<usize> {
        self.config.targets.rank(prize)
    }

    /// Draw against the displayed inventory and record the award.
    ///
    /// The ledger is bumped only when the chosen prize is a displayed key
    /// whose stock went down. The lose sentinel returned for an empty
    /// inventory is therefore never counted, while a sentinel that is also a
    /// stocked prize is.
    pub fn perform_draw<R: RandomSource + ?Sized>(&mut self, visits: u32, rng: &mut R) -> String {
        let outcome = draw(&self.displayed, &self.weights, visits, &self.config, rng);
        let before = self.displayed.get(&outcome.prize).copied();
        let after = outcome.remaining.stock_of(&outcome.prize);
        if before.is_some_and(|stock| stock > after) {
            self.counter.increment(&outcome.prize, 1);
        }
        self.recompute();
        log::info!(
            "draw awarded {} with {} visits, {} left in stock",
            outcome.prize,
            visits,
            self.total_stock()
        );
        outcome.prize
    }

    /// Adjust base stock per prize. Negative deltas are allowed; stock never
    /// drops below zero. Unknown prizes are appended.
    pub fn add_stock(&mut self, delta: &PrizeMap<i64>) {
        for (name, &change) in delta.iter() {
            let current = i64::from(self.base_stock.stock_of(name));
            let next = clamp_i64_to_u32(current.saturating_add(change));
            self.base_stock.insert(name, next);
        }
        persist(self.base_store.as_ref(), StoreKey::BaseStock, &self.base_stock);
        log::info!("base stock adjusted, now {} units", self.base_stock.total());
        self.recompute();
    }

    pub fn update_params(&mut self, patch: ParamsPatch) {
        self.config.params = patch.apply(self.config.params);
        persist(self.params_store.as_ref(), StoreKey::Params, &self.config.params);
        log::info!("boost params updated: {:?}", self.config.params);
    }

    pub fn update_weights(&mut self, weights: Weights) {
        self.weights = weights;
        persist(self.weights_store.as_ref(), StoreKey::Weights, &self.weights);
        log::info!("weights updated for {} prizes", self.weights.len());
    }

    pub fn update_targets(&mut self, gain_targets: Vec<String>, lose_names: Vec<String>) {
        self.config.targets = PrizeTargets {
            gain_targets,
            lose_names,
        };
        persist(self.targets_store.as_ref(), StoreKey::Targets, &self.config.targets);
        log::info!("prize targets updated: {:?}", self.config.targets);
    }

    /// Clear the ledger and restore the initial stock. Irreversible.
    pub fn reset_all(&mut self) {
        self.counter.clear();
        self.base_stock = self.initial_stock.clone();
        persist(self.base_store.as_ref(), StoreKey::BaseStock, &self.base_stock);
        log::info!("session reset to initial stock");
        self.recompute();
    }

    /// Re-read the ledger, picking up counts written elsewhere.
    pub fn sync(&mut self) {
        self.recompute();
    }

    fn recompute(&mut self) {
        self.displayed = apply_counts(&self.base_stock, &self.counter.read());
    }
}

impl fmt::Debug for DrawSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawSession")
            .field("base_stock", &self.base_stock)
            .field("displayed", &self.displayed)
            .field("weights", &self.weights)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
