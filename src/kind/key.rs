use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;

use super::ValueKind;
use crate::sink::SinkError;

static NEXT_STREAM_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a stream within a sink.
///
/// Every call to [`StreamKey::new`] yields a distinct key, so two streams with
/// identical columns are never aliased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey(u64);

impl StreamKey {
    pub fn new() -> Self {
        StreamKey(NEXT_STREAM_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StreamKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

struct KeyInner {
    name: String,
    kind: ValueKind,
}

/// Identity of a logical column: a name and a kind.
///
/// Keys compare by identity. Two keys built from the same name and kind are
/// different columns; clones of one key are the same column.
#[derive(Clone)]
pub struct Key(Arc<KeyInner>);

impl Key {
    pub fn of(name: impl Into<String>, kind: impl Into<ValueKind>) -> Self {
        Key(Arc::new(KeyInner {
            name: name.into(),
            kind: kind.into(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &ValueKind {
        &self.0.kind
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({}: {})", self.0.name, self.0.kind)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// The ordered columns of a stream.
#[derive(Debug, Clone, Default)]
pub struct Keys {
    keys: IndexSet<Key>,
}

impl Keys {
    pub fn builder() -> KeysBuilder {
        KeysBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Column index of `key`, if it belongs to this stream.
    pub fn index_of(&self, key: &Key) -> Option<usize> {
        self.keys.get_index_of(key)
    }

    pub fn get(&self, column: usize) -> Option<&Key> {
        self.keys.get_index(column)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }
}

impl<'a> IntoIterator for &'a Keys {
    type Item = &'a Key;
    type IntoIter = indexmap::set::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[derive(Debug, Default)]
pub struct KeysBuilder {
    keys: Vec<Key>,
}

impl KeysBuilder {
    pub fn add(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    pub fn add_all(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Fails if the same key was added twice.
    pub fn build(self) -> Result<Keys, SinkError> {
        let mut set = IndexSet::with_capacity(self.keys.len());
        for key in self.keys {
            let name = key.name().to_string();
            if !set.insert(key) {
                return Err(SinkError::DuplicateKey { key: name });
            }
        }
        Ok(Keys { keys: set })
    }
}
