//! Cumulative draw counters and stock reconciliation.
//!
//! The counter record is the only ledger of consumed stock. Displayed stock is
//! always `base - counts`, floored at zero.
use serde::de::{Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::numbers::{clamp_i64_to_u32, coerce_count};
use crate::prize_map::{Inventory, PrizeMap};
use crate::store::Store;

/// A counter value that decodes leniently: numbers and numeric strings are
/// floored, anything negative, non-finite or non-numeric becomes 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally(u32);

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

struct TallyVisitor;

impl<'de> Visitor<'de> for TallyVisitor {
    type Value = Tally;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a draw count")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Tally, E> {
        Ok(Tally(u32::from(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Tally, E> {
        Ok(Tally(clamp_i64_to_u32(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Tally, E> {
        Ok(Tally(u32::try_from(v).unwrap_or(u32::MAX)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Tally, E> {
        Ok(Tally(coerce_count(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Tally, E> {
        Ok(Tally(v.trim().parse::<f64>().map_or(0, coerce_count)))
    }

    fn visit_unit<E>(self) -> Result<Tally, E> {
        Ok(Tally(0))
    }

    fn visit_none<E>(self) -> Result<Tally, E> {
        Ok(Tally(0))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Tally, D::Error> {
        Tally::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Tally, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Tally(0))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tally, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Tally(0))
    }
}

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TallyVisitor)
    }
}

/// Cumulative awards per prize since the last reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawCounts {
    counts: PrizeMap<Tally>,
}

impl DrawCounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a prize; absent prizes read as zero.
    #[must_use]
    pub fn get(&self, prize: &str) -> u32 {
        self.counts.get(prize).map_or(0, |tally| tally.0)
    }

    pub fn set(&mut self, prize: impl Into<String>, count: u32) {
        self.counts.insert(prize, Tally(count));
    }

    /// Add to a prize's count, saturating. Returns the new count.
    pub fn add(&mut self, prize: &str, delta: u32) -> u32 {
        let next = self.get(prize).saturating_add(delta);
        self.set(prize, next);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(name, tally)| (name, tally.0))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| u64::from(count)).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for DrawCounts {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            counts: iter
                .into_iter()
                .map(|(name, count)| (name, Tally(count)))
                .collect(),
        }
    }
}

/// Subtract consumed counts from base stock, floored at zero per prize.
/// Keys and key order are the base stock's.
#[must_use]
pub fn apply_counts(base: &Inventory, counts: &DrawCounts) -> Inventory {
    base.map_values(|name, stock| stock.saturating_sub(counts.get(name)))
}

/// Best-effort durable counter ledger.
///
/// Reads never fail: missing or undecodable records read as empty. Write
/// failures are logged and dropped. Increments are read-modify-write with no
/// cross-process atomicity; the last writer wins.
pub struct CounterStore {
    store: Box<dyn Store<DrawCounts>>,
}

impl CounterStore {
    #[must_use]
    pub fn new(store: Box<dyn Store<DrawCounts>>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn read(&self) -> DrawCounts {
        match self.store.read() {
            Ok(counts) => counts.unwrap_or_default(),
            Err(err) => {
                log::warn!("draw counts unreadable, treating as empty: {err}");
                DrawCounts::default()
            }
        }
    }

    pub fn write(&self, counts: &DrawCounts) {
        if let Err(err) = self.store.write(counts) {
            log::warn!("failed to persist draw counts: {err}");
        }
    }

    /// Add `delta` to one prize and persist. Returns the updated ledger.
    pub fn increment(&self, prize: &str, delta: u32) -> DrawCounts {
        let mut counts = self.read();
        let next = counts.add(prize, delta);
        log::debug!("draw count for {prize} now {next}");
        self.write(&counts);
        counts
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            log::warn!("failed to clear draw counts: {err}");
        }
    }
}

impl fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterStore").finish_non_exhaustive()
    }
}
