//! Flat leaf collections produced by flattening.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graphdef::DescriptorSerdeError;
use crate::path::Path;
use crate::value::Value;

/// Ordered mapping from [`Path`] to leaf [`Value`].
///
/// Insertion order follows the producing traversal (pre-order, definition
/// order within a node) and is part of equality: two states are equal when
/// their ordered entries match pairwise. Tags are not stored here; they are
/// recoverable from the descriptor produced alongside the state.
#[derive(Debug, Clone, Default)]
pub struct State {
    order: Vec<Path>,
    values: HashMap<Path, Value>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inserts an entry, returning the previous value if the path was already
    /// present (the original insertion position is kept).
    pub fn insert(&mut self, path: Path, value: Value) -> Option<Value> {
        match self.values.insert(path.clone(), value) {
            Some(previous) => Some(previous),
            None => {
                self.order.push(path);
                None
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.values.contains_key(path)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Value)> + '_ {
        self.order.iter().map(move |path| {
            let value = self
                .values
                .get(path)
                .expect("state order desynchronized from values");
            (path, value)
        })
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.order.iter()
    }

    pub fn to_json_string(&self) -> Result<String, DescriptorSerdeError> {
        serde_json::to_string_pretty(self).map_err(DescriptorSerdeError::from)
    }

    pub fn from_json_str(src: &str) -> Result<Self, DescriptorSerdeError> {
        serde_json::from_str(src).map_err(DescriptorSerdeError::from)
    }

    pub fn to_bincode_bytes(&self) -> Result<Vec<u8>, DescriptorSerdeError> {
        bincode::serialize(self).map_err(DescriptorSerdeError::from)
    }

    pub fn from_bincode_slice(bytes: &[u8]) -> Result<Self, DescriptorSerdeError> {
        bincode::deserialize(bytes).map_err(DescriptorSerdeError::from)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.order.len() == other.order.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<(Path, Value)>::deserialize(deserializer)?;
        let mut state = State::new();
        for (path, value) in entries {
            state.insert(path, value);
        }
        Ok(state)
    }
}

impl FromIterator<(Path, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (Path, Value)>>(iter: I) -> Self {
        let mut state = State::new();
        for (path, value) in iter {
            state.insert(path, value);
        }
        state
    }
}
