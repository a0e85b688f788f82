//! Whole-object key-value persistence.
//!
//! The engine never reads or writes individual fields: every save replaces
//! the full value under its key, and a missing key reads as the type's default.
//!
//! ## Example
//!
//! ```
//! use scorekeeper::store::{MemoryStore, TournamentStore};
//!
//! let mut store = TournamentStore::new(MemoryStore::default());
//! assert!(store.load_tournaments("volleyball").unwrap().is_empty());
//! store.save_tournaments("volleyball", &[]).unwrap();
//! ```

pub mod errors;
pub mod file;
pub mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::tournament::models::Tournament;

/// Backing storage with read-whole / write-whole semantics
pub trait KeyValueStore {
    fn read(&self, key: &str) -> StoreResult<Option<Value>>;
    fn write(&mut self, key: &str, value: Value) -> StoreResult<()>;
}

/// Typed access to tournaments and the other persisted collections
#[derive(Debug)]
pub struct TournamentStore<S> {
    inner: S,
}

impl<S: KeyValueStore> TournamentStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn tournaments_key(sport: &str) -> String {
        format!("tournaments:{sport}")
    }

    /// Read a value, falling back to `T::default()` when the key is absent
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> StoreResult<T> {
        match self.inner.read(key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(T::default()),
        }
    }

    /// Replace the value under `key`
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value)?;
        self.inner.write(key, value)
    }

    pub fn load_tournaments(&self, sport: &str) -> StoreResult<Vec<Tournament>> {
        self.load_or_default(&Self::tournaments_key(sport))
    }

    pub fn save_tournaments(&mut self, sport: &str, tournaments: &[Tournament]) -> StoreResult<()> {
        self.save(&Self::tournaments_key(sport), tournaments)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
