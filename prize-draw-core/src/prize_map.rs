//! Insertion-ordered prize maps.
//!
//! Key order is significant: the draw walks prizes in this order, so ties and
//! rounding fallbacks resolve by it. JSON objects keep their document order
//! when decoded.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::marker::PhantomData;

/// Remaining stock per prize.
pub type Inventory = PrizeMap<u32>;

/// Relative base likelihood per unit of stock.
pub type Weights = PrizeMap<f64>;

/// Ordered mapping from prize name to a value.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeMap<V> {
    entries: SmallVec<[(String, V); 8]>,
}

impl<V> Default for PrizeMap<V> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<V> PrizeMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a value. Existing keys keep their position; new keys
    /// are appended. Returns the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        if let Some(slot) = self.get_mut(&name) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((name, value));
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Build a new map with the same keys and order.
    pub fn map_values<U>(&self, mut f: impl FnMut(&str, &V) -> U) -> PrizeMap<U> {
        PrizeMap {
            entries: self
                .entries
                .iter()
                .map(|(name, value)| (name.clone(), f(name, value)))
                .collect(),
        }
    }
}

impl PrizeMap<u32> {
    /// Stock for a prize; absent keys read as zero.
    #[must_use]
    pub fn stock_of(&self, name: &str) -> u32 {
        self.get(name).copied().unwrap_or(0)
    }

    /// Sum of all stock.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.values().map(|stock| u64::from(*stock)).sum()
    }
}

impl PrizeMap<f64> {
    /// Weight for a prize. Absent, negative and non-finite weights read as zero.
    #[must_use]
    pub fn weight_of(&self, name: &str) -> f64 {
        self.get(name)
            .copied()
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or(0.0)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for PrizeMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl<V> IntoIterator for PrizeMap<V> {
    type Item = (String, V);
    type IntoIter = smallvec::IntoIter<[(String, V); 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for PrizeMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct PrizeMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for PrizeMapVisitor<V> {
    type Value = PrizeMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by prize name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = PrizeMap::new();
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for PrizeMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PrizeMapVisitor(PhantomData))
    }
}
