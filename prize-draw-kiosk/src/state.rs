//! File-backed session state: one JSON file per record in a state directory.
use anyhow::{Context, Result};
use prize_draw_core::SessionOptions;
use prize_draw_core::session::SessionStores;
use prize_draw_core::store::{Slot, StoreError, StoreKey};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One record file. Writes go through a temp file and a rename so a crash
/// never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl Slot for FileSlot {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, raw: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// File name of a record inside the state directory.
#[must_use]
pub fn record_path(dir: &Path, key: StoreKey) -> PathBuf {
    dir.join(format!("{}.json", key.as_str()))
}

/// Session stores rooted at `dir`.
#[must_use]
pub fn open_stores(dir: &Path) -> SessionStores {
    SessionStores::from_slots(|key| {
        Box::new(FileSlot::new(record_path(dir, key))) as Box<dyn Slot>
    })
}

/// Load session options from a JSON file, or the event defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid options JSON.
pub fn load_options(path: Option<&Path>) -> Result<SessionOptions> {
    let Some(path) = path else {
        return Ok(SessionOptions::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read options file {}", path.display()))?;
    SessionOptions::from_json(&raw)
        .with_context(|| format!("invalid options file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "prize-draw-state-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn file_slot_roundtrips_and_cleans_up() {
        let dir = temp_dir("slot");
        let slot = FileSlot::new(record_path(&dir, StoreKey::DrawCounts));
        assert_eq!(slot.get().unwrap(), None);
        slot.set(r#"{"A":1}"#).unwrap();
        assert_eq!(slot.get().unwrap().as_deref(), Some(r#"{"A":1}"#));
        assert!(!slot.tmp_path().exists());
        slot.remove().unwrap();
        slot.remove().unwrap();
        assert_eq!(slot.get().unwrap(), None);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn record_paths_use_store_keys() {
        let path = record_path(Path::new("state"), StoreKey::BaseStock);
        assert_eq!(path, Path::new("state").join("lottery.baseStock.v1.json"));
    }

    #[test]
    fn options_default_without_file() {
        let options = load_options(None).unwrap();
        assert_eq!(options.initial_stock.total(), 550);
    }

    #[test]
    fn options_file_errors_carry_path() {
        let dir = temp_dir("options");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("options.json");
        fs::write(&path, "{ nope").unwrap();
        let err = load_options(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid options file"));
        let _ = fs::remove_dir_all(dir);
    }
}
