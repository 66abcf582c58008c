//! Durable key-value slots for the game state

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::farm::{FarmRules, GameState};

/// A string-valued key-value store, the same shape as browser local storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Keeps one `<key>.json` file per slot inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Write then rename so a failed write never clobbers the previous save.
        let target = self.slot_path(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&staging, value)?;
        fs::rename(staging, target)
    }
}

/// In-process store. Can be switched off to behave like disabled storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check(&self) -> io::Result<()> {
        if self.unavailable {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is disabled",
            ))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        self.check()?;
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.check()?;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] io::Error),
    #[error("no saved farm under '{0}'")]
    NotFound(String),
    #[error("saved farm is corrupt: {0}")]
    CorruptState(String),
}

/// How `load_or_initialize` obtained its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Saved,
    FirstRun,
    Recovered,
}

/// Reads and writes the whole game state under a single well-known key.
pub struct StateStore {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl StateStore {
    pub fn new(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save_state(&mut self, state: &GameState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(state)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.store.set(&self.key, &json)?;
        Ok(())
    }

    /// Loads the saved state. A record that parses but breaks the farm's
    /// invariants under `rules` counts as corrupt.
    pub fn load_state(&self, rules: &FarmRules) -> Result<GameState, PersistenceError> {
        let raw = self
            .store
            .get(&self.key)?
            .ok_or_else(|| PersistenceError::NotFound(self.key.clone()))?;
        let state: GameState = serde_json::from_str(&raw)
            .map_err(|err| PersistenceError::CorruptState(err.to_string()))?;
        state
            .validate(rules)
            .map_err(|err| PersistenceError::CorruptState(err.to_string()))?;
        Ok(state)
    }

    /// Never hands back a partial state: anything other than a clean load
    /// yields a freshly initialized farm.
    pub fn load_or_initialize(&self, rules: &FarmRules) -> (GameState, LoadSource) {
        match self.load_state(rules) {
            Ok(state) => {
                info!("loaded saved farm from '{}' (day {})", self.key, state.day);
                (state, LoadSource::Saved)
            }
            Err(PersistenceError::NotFound(_)) => {
                info!("no saved farm under '{}', starting fresh", self.key);
                (GameState::initialize(rules), LoadSource::FirstRun)
            }
            Err(err) => {
                warn!("{err}; starting a fresh farm");
                (GameState::initialize(rules), LoadSource::Recovered)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CreatureDefinition;
    use crate::farm::Farm;

    fn busy_state() -> GameState {
        let mut farm = Farm::new(FarmRules::default());
        farm.select(CreatureDefinition::new("agu", "Agumon"));
        farm.tap_cell(3).unwrap();
        farm.tap_cell(3).unwrap();
        farm.advance_day();
        farm.into_state()
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = StateStore::new(MemoryStore::new(), "digifarm_state");
        assert!(matches!(
            store.load_state(&FarmRules::default()),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn memory_round_trip() {
        let mut store = StateStore::new(MemoryStore::new(), "digifarm_state");
        let state = busy_state();
        store.save_state(&state).unwrap();
        assert_eq!(store.load_state(&FarmRules::default()).unwrap(), state);
    }

    #[test]
    fn layout_uses_prototype_field_names() {
        let mut memory = MemoryStore::new();
        let state = busy_state();
        let json = serde_json::to_string(&state).unwrap();
        memory.set("digifarm_state", &json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["day"], 2);
        assert_eq!(value["bits"], 18);
        assert_eq!(value["grid"].as_array().unwrap().len(), 120);
        assert!(value["grid"][0].is_null());
        assert_eq!(value["grid"][3]["name"], "Agumon");
        assert_eq!(value["grid"][3]["stage"], 2);
        assert_eq!(value["selected"]["id"], "agu");
    }

    #[test]
    fn disabled_storage_is_unavailable() {
        let mut memory = MemoryStore::new();
        memory.set_unavailable(true);
        let mut store = StateStore::new(memory, "digifarm_state");

        assert!(matches!(
            store.save_state(&busy_state()),
            Err(PersistenceError::StorageUnavailable(_))
        ));
        let (state, source) = store.load_or_initialize(&FarmRules::default());
        assert_eq!(source, LoadSource::Recovered);
        assert_eq!(state, GameState::initialize(&FarmRules::default()));
    }

    #[test]
    fn negative_bits_are_corrupt() {
        let mut memory = MemoryStore::new();
        memory
            .set(
                "digifarm_state",
                r#"{"day":1,"bits":-5,"grid":[],"selected":null}"#,
            )
            .unwrap();
        let store = StateStore::new(memory, "digifarm_state");
        assert!(matches!(
            store.load_state(&FarmRules::default()),
            Err(PersistenceError::CorruptState(_))
        ));
    }
}
