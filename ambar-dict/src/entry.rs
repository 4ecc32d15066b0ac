//! Dictionary entries: key, tagged value slot, chain link, metadata tail.

use std::fmt;

/// The value slot of an [`Entry`].
///
/// The slot holds either an owned value or one of three inline scalar
/// payloads. The discriminant is explicit; callers do not have to remember
/// which accessor is live for a given key class.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<V> {
    /// An owned value.
    Val(V),
    /// Unsigned 64-bit integer payload.
    U64(u64),
    /// Signed 64-bit integer payload.
    I64(i64),
    /// 64-bit float payload.
    F64(f64),
}

impl<V> Value<V> {
    /// The owned value, if that variant is live.
    pub fn as_val(&self) -> Option<&V> {
        match self {
            Value::Val(v) => Some(v),
            _ => None,
        }
    }

    /// The unsigned integer payload, if that variant is live.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// The signed integer payload, if that variant is live.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if that variant is live.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

/// A key/value cell in a bucket chain.
///
/// Entries own their key and value; dropping an entry drops both. The
/// metadata tail is sized by the dictionary's type vtable and zero-filled at
/// creation.
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) val: Option<Value<V>>,
    pub(crate) next: Option<Box<Entry<K, V>>>,
    pub(crate) metadata: Box<[u8]>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, metadata_bytes: usize) -> Self {
        Entry {
            key,
            val: None,
            next: None,
            metadata: vec![0u8; metadata_bytes].into_boxed_slice(),
        }
    }

    /// The entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value slot. `None` only between `add_raw` and the first
    /// `set_value`.
    pub fn value(&self) -> Option<&Value<V>> {
        self.val.as_ref()
    }

    /// Mutable access to the value slot.
    pub fn value_mut(&mut self) -> Option<&mut Value<V>> {
        self.val.as_mut()
    }

    /// Store a value, returning the previous one.
    pub fn set_value(&mut self, val: Value<V>) -> Option<Value<V>> {
        self.val.replace(val)
    }

    /// Move the value out of the slot.
    pub fn take_value(&mut self) -> Option<Value<V>> {
        self.val.take()
    }

    /// Caller-defined trailing metadata.
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Mutable access to the metadata tail.
    pub fn metadata_mut(&mut self) -> &mut [u8] {
        &mut self.metadata
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("val", &self.val)
            .finish_non_exhaustive()
    }
}
