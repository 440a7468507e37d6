//! Prize Draw Engine
//!
//! Platform-agnostic core of the event prize kiosk: visit counting, boosted
//! odds, finite-stock draws, the persisted draw ledger and the session and
//! screen flow built on top of them. Storage and randomness are injected, so
//! this crate has no browser or filesystem dependencies.

pub mod admin;
pub mod config;
pub mod constants;
pub mod counts;
pub mod draw;
pub mod kiosk;
pub mod numbers;
pub mod odds;
pub mod prize_map;
pub mod session;
pub mod store;
pub mod visits;

// Re-export commonly used types
pub use config::{BoostParams, DrawConfig, ParamsPatch, PrizeTargets, SessionOptions};
pub use constants::LOSE_SENTINEL;
pub use counts::{CounterStore, DrawCounts, apply_counts};
pub use draw::{DrawOutcome, RandomSource, UnitSequence, draw};
pub use kiosk::{FlowError, KioskFlow, KioskPhase};
pub use odds::{ProbRow, compute_probs};
pub use prize_map::{Inventory, PrizeMap, Weights};
pub use session::{DrawSession, Eligibility, SessionStores};
pub use store::{JsonStore, MemorySlot, MemoryStore, Slot, Store, StoreError, StoreKey};
pub use visits::{VisitEntry, VisitHistory, compute_visits, visits_from_json};
