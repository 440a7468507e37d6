//! Durable record abstraction.
//!
//! Each persisted record (draw counts, base stock, params, weights, targets)
//! lives behind its own [`Store`]. Platform crates supply raw string
//! [`Slot`]s; [`JsonStore`] layers serde on top.
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single typed durable record.
pub trait Store<T> {
    /// Read the record; `Ok(None)` when nothing has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored data cannot be decoded.
    fn read(&self) -> Result<Option<T>, StoreError>;

    /// Replace the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or the backend rejects it.
    fn write(&self, value: &T) -> Result<(), StoreError>;

    /// Remove the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Raw string storage for one key.
pub trait Slot {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, raw: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self) -> Result<(), StoreError>;
}

impl<S: Slot + ?Sized> Slot for Box<S> {
    fn get(&self) -> Result<Option<String>, StoreError> {
        (**self).get()
    }

    fn set(&self, raw: &str) -> Result<(), StoreError> {
        (**self).set(raw)
    }

    fn remove(&self) -> Result<(), StoreError> {
        (**self).remove()
    }
}

/// Names of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    DrawCounts,
    BaseStock,
    Params,
    Weights,
    Targets,
}

impl StoreKey {
    pub const ALL: [Self; 5] = [
        Self::DrawCounts,
        Self::BaseStock,
        Self::Params,
        Self::Weights,
        Self::Targets,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrawCounts => "drawCounts",
            Self::BaseStock => "lottery.baseStock.v1",
            Self::Params => "lottery.params.v1",
            Self::Weights => "lottery.weights.v1",
            Self::Targets => "lottery.targets.v1",
        }
    }
}

/// JSON-encoded record over a raw slot.
pub struct JsonStore<S, T> {
    slot: S,
    _record: PhantomData<fn() -> T>,
}

impl<S: Slot, T> JsonStore<S, T> {
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            _record: PhantomData,
        }
    }

    pub const fn slot(&self) -> &S {
        &self.slot
    }
}

impl<S: Slot, T: Serialize + DeserializeOwned> Store<T> for JsonStore<S, T> {
    fn read(&self) -> Result<Option<T>, StoreError> {
        match self.slot.get()? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write(&self, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.slot.set(&raw)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.slot.remove()
    }
}

/// In-memory slot. Clones share the same cell, so tests can keep a handle to
/// inspect or corrupt what a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    cell: Rc<RefCell<Option<String>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_raw(raw: &str) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Some(raw.to_string()))),
        }
    }

    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.cell.borrow().clone()
    }
}

impl Slot for MemorySlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.cell.borrow().clone())
    }

    fn set(&self, raw: &str) -> Result<(), StoreError> {
        *self.cell.borrow_mut() = Some(raw.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        *self.cell.borrow_mut() = None;
        Ok(())
    }
}

/// In-memory typed store, skipping serialization entirely.
#[derive(Debug)]
pub struct MemoryStore<T> {
    cell: Rc<RefCell<Option<T>>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            cell: Rc::new(RefCell::new(None)),
        }
    }
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<T> {
        self.cell.borrow().clone()
    }
}

impl<T: Clone> Store<T> for MemoryStore<T> {
    fn read(&self) -> Result<Option<T>, StoreError> {
        Ok(self.cell.borrow().clone())
    }

    fn write(&self, value: &T) -> Result<(), StoreError> {
        *self.cell.borrow_mut() = Some(value.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.cell.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prize_map::Inventory;

    #[test]
    fn json_store_roundtrips_through_slot() {
        let slot = MemorySlot::new();
        let store: JsonStore<_, Inventory> = JsonStore::new(slot.clone());
        assert!(store.read().unwrap().is_none());

        let inv: Inventory = [("A", 2), ("B", 0)].into_iter().collect();
        store.write(&inv).unwrap();
        assert_eq!(slot.raw().as_deref(), Some(r#"{"A":2,"B":0}"#));
        assert_eq!(store.read().unwrap(), Some(inv));

        store.clear().unwrap();
        assert!(slot.raw().is_none());
    }

    #[test]
    fn corrupt_slot_surfaces_serialization_error() {
        let store: JsonStore<_, Inventory> = JsonStore::new(MemorySlot::with_raw("{oops"));
        assert!(matches!(store.read(), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::<u32>::new();
        let handle = store.clone();
        store.write(&5).unwrap();
        assert_eq!(handle.snapshot(), Some(5));
        handle.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn keys_are_distinct() {
        let mut names: Vec<&str> = StoreKey::ALL.iter().map(|key| key.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StoreKey::ALL.len());
    }
}
