//! Insertion-ordered hash table keyed by runtime values.

use std::hash::{Hash, Hasher};

use hashbrown::HashTable;
use rustc_hash::FxHasher;

use crate::RuntimeError;
use crate::ops;
use crate::value::{RECURSION_LIMIT, Value};

#[derive(Clone)]
struct Slot {
    hash: u64,
    key: Value,
    value: Value,
}

/// Backing store of both dicts and sets.
///
/// `entries` keeps insertion order with holes left by removals; `table` maps
/// hashes to positions in it.
#[derive(Clone, Default)]
pub struct Dict {
    entries: Vec<Option<Slot>>,
    table: HashTable<usize>,
    len: usize,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, RuntimeError> {
        let hash = hash(key)?;
        let slot = self.find(hash, key)?.and_then(|index| self.entries[index].as_ref());
        Ok(slot.map(|slot| &slot.value))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, RuntimeError> {
        let hash = hash(key)?;
        Ok(self.find(hash, key)?.is_some())
    }

    /// Sets `key` to `value`. An equal key already present keeps its place and
    /// its original object.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), RuntimeError> {
        let hash = hash(&key)?;
        if let Some(index) = self.find(hash, &key)? {
            if let Some(slot) = &mut self.entries[index] {
                slot.value = value;
            }
            return Ok(());
        }

        let index = self.entries.len();
        self.entries.push(Some(Slot { hash, key, value }));
        let entries = &self.entries;
        self.table.insert_unique(hash, index, |&index| slot_hash(entries, index));
        self.len += 1;
        Ok(())
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, RuntimeError> {
        let hash = hash(key)?;
        let Some(index) = self.find(hash, key)? else {
            return Ok(None);
        };

        if let Ok(entry) = self.table.find_entry(hash, |&candidate| candidate == index) {
            entry.remove();
        }
        let slot = self.entries[index].take();
        self.len -= 1;
        if self.entries.len() > 2 * self.len + 8 {
            self.compact();
        }
        Ok(slot.map(|slot| slot.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().flatten().map(|slot| (&slot.key, &slot.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(key, _)| key)
    }

    /// Moves every key and value onto `stack`, leaving the table empty.
    pub(crate) fn drain_into(&mut self, stack: &mut Vec<Value>) {
        for slot in self.entries.drain(..).flatten() {
            stack.push(slot.key);
            stack.push(slot.value);
        }
        self.table.clear();
        self.len = 0;
    }

    fn find(&self, hash: u64, key: &Value) -> Result<Option<usize>, RuntimeError> {
        let mut error = None;
        let found = self.table.find(hash, |&index| match &self.entries[index] {
            Some(slot) if slot.hash == hash => {
                ops::equal(&slot.key, key).unwrap_or_else(|err| {
                    error.get_or_insert(err);
                    false
                })
            }
            _ => false,
        });

        match error {
            Some(error) => Err(error),
            None => Ok(found.copied()),
        }
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        self.table.clear();
        let entries = &self.entries;
        for index in 0..entries.len() {
            self.table.insert_unique(slot_hash(entries, index), index, |&index| {
                slot_hash(entries, index)
            });
        }
    }
}

fn slot_hash(entries: &[Option<Slot>], index: usize) -> u64 {
    entries[index].as_ref().map_or(0, |slot| slot.hash)
}

/// Hash consistent with [`ops::equal`]: numbers that compare equal hash
/// equally whatever their type.
pub(crate) fn hash(value: &Value) -> Result<u64, RuntimeError> {
    let mut hasher = FxHasher::default();
    feed(value, &mut hasher, 0)?;
    Ok(hasher.finish())
}

fn feed(value: &Value, hasher: &mut FxHasher, depth: usize) -> Result<(), RuntimeError> {
    if depth > RECURSION_LIMIT {
        return Err(RuntimeError::Recursion("while hashing"));
    }

    match value {
        Value::None => 0u8.hash(hasher),
        Value::Bool(value) => (1u8, i64::from(*value)).hash(hasher),
        Value::Int(value) => (1u8, *value).hash(hasher),
        Value::Float(value) => match ops::integral(*value) {
            Some(value) => (1u8, value).hash(hasher),
            None => (2u8, value.to_bits()).hash(hasher),
        },
        Value::Str(text) => (3u8, &**text).hash(hasher),
        Value::Bytes(bytes) => (4u8, &**bytes).hash(hasher),
        Value::Tuple(items) => {
            (5u8, items.len()).hash(hasher);
            for item in items.iter() {
                feed(item, hasher, depth + 1)?;
            }
        }
        Value::Range(range) => {
            let len = range.len();
            (6u8, len).hash(hasher);
            if len > 0 {
                range.start.hash(hasher);
            }
            if len > 1 {
                range.step.hash(hasher);
            }
        }
        Value::Builtin(builtin) => (7u8, builtin.name()).hash(hasher),
        Value::List(_) | Value::Set(_) | Value::Dict(_) | Value::Generator(_) => {
            return Err(RuntimeError::Type(format!("unhashable type: '{}'", value.type_name())));
        }
    }
    Ok(())
}
