//! Packed byte-array storage for small elements.
//!
//! A `Listpack` owns one contiguous buffer of encoded elements plus an
//! element count. Elements whose bytes spell a canonical decimal `i64` are
//! stored integer-encoded; everything else is stored verbatim with a length
//! prefix. The byte format is internal to this crate and carries no
//! compatibility promise.
//!
//! Offsets are element indices. Random access walks the buffer, so reads
//! are O(count) worst case; head/tail appends are O(1) amortized.

/// Element stored verbatim: tag, u32 little-endian length, bytes.
const TAG_STR: u8 = 0;
/// Element stored as a little-endian i64: tag, 8 bytes.
const TAG_INT: u8 = 1;

/// A decoded element view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpValue<'a> {
    /// Borrowed raw bytes.
    Bytes(&'a [u8]),
    /// Integer-encoded element.
    Int(i64),
}

impl LpValue<'_> {
    /// Compare against raw bytes; integer elements compare by their
    /// canonical decimal rendering.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        match self {
            LpValue::Bytes(b) => *b == other,
            LpValue::Int(i) => parse_int(other) == Some(*i),
        }
    }

    /// Copy the element out, rendering integers in decimal.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            LpValue::Bytes(b) => b.to_vec(),
            LpValue::Int(i) => i.to_string().into_bytes(),
        }
    }
}

/// Strict decimal parse: the bytes must round-trip through `i64` formatting
/// (no leading zeros, no `+`, no whitespace).
pub(crate) fn parse_int(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || bytes.len() > 20 {
        return None;
    }
    let s = std::str::from_utf8(bytes).ok()?;
    let i: i64 = s.parse().ok()?;
    if i.to_string().as_bytes() != bytes {
        return None;
    }
    Some(i)
}

/// A packed array of small elements.
#[derive(Clone, Default)]
pub struct Listpack {
    data: Vec<u8>,
    count: u32,
}

impl Listpack {
    /// New empty listpack.
    pub fn new() -> Self {
        Listpack::default()
    }

    pub(crate) fn from_raw_parts(data: Vec<u8>, count: u32) -> Self {
        Listpack { data, count }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// True when no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Buffer size in bytes.
    pub fn num_bytes(&self) -> usize {
        self.data.len()
    }

    /// Upper bound on the encoded size of a value, for capacity decisions.
    pub(crate) fn encoded_size_hint(value_len: usize) -> usize {
        1 + 4 + value_len
    }

    fn entry_span(&self, at: usize) -> usize {
        match self.data[at] {
            TAG_INT => 1 + 8,
            TAG_STR => {
                let len =
                    u32::from_le_bytes(self.data[at + 1..at + 5].try_into().unwrap()) as usize;
                1 + 4 + len
            }
            tag => panic!("corrupt listpack entry tag {tag}"),
        }
    }

    fn byte_offset(&self, index: usize) -> usize {
        let mut off = 0;
        for _ in 0..index {
            off += self.entry_span(off);
        }
        off
    }

    fn encode(value: &[u8], out: &mut Vec<u8>) {
        match parse_int(value) {
            Some(i) => {
                out.push(TAG_INT);
                out.extend_from_slice(&i.to_le_bytes());
            }
            None => {
                out.push(TAG_STR);
                out.extend_from_slice(&(value.len() as u32).to_le_bytes());
                out.extend_from_slice(value);
            }
        }
    }

    /// Append an element.
    pub fn push_tail(&mut self, value: &[u8]) {
        Self::encode(value, &mut self.data);
        self.count += 1;
    }

    /// Prepend an element.
    pub fn push_head(&mut self, value: &[u8]) {
        self.insert(0, value);
    }

    /// Insert before the element at `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, value: &[u8]) {
        assert!(index <= self.len(), "listpack insert out of range");
        if index == self.len() {
            return self.push_tail(value);
        }
        let off = self.byte_offset(index);
        let mut enc = Vec::with_capacity(Self::encoded_size_hint(value.len()));
        Self::encode(value, &mut enc);
        self.data.splice(off..off, enc);
        self.count += 1;
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, index: usize) {
        self.remove_range(index, 1);
    }

    /// Remove `n` consecutive elements starting at `index`.
    pub fn remove_range(&mut self, index: usize, n: usize) {
        assert!(index + n <= self.len(), "listpack remove out of range");
        let start = self.byte_offset(index);
        let mut end = start;
        for _ in 0..n {
            end += self.entry_span(end);
        }
        self.data.drain(start..end);
        self.count -= n as u32;
    }

    /// Decode the element at `index`.
    pub fn get(&self, index: usize) -> LpValue<'_> {
        assert!(index < self.len(), "listpack index out of range");
        let at = self.byte_offset(index);
        match self.data[at] {
            TAG_INT => LpValue::Int(i64::from_le_bytes(
                self.data[at + 1..at + 9].try_into().unwrap(),
            )),
            _ => {
                let len =
                    u32::from_le_bytes(self.data[at + 1..at + 5].try_into().unwrap()) as usize;
                LpValue::Bytes(&self.data[at + 5..at + 5 + len])
            }
        }
    }

    /// Overwrite the element at `index` in place.
    pub fn replace(&mut self, index: usize, value: &[u8]) {
        assert!(index < self.len(), "listpack replace out of range");
        let off = self.byte_offset(index);
        let span = self.entry_span(off);
        let mut enc = Vec::with_capacity(Self::encoded_size_hint(value.len()));
        Self::encode(value, &mut enc);
        self.data.splice(off..off + span, enc);
    }

    /// Split into `([0, index), [index, len))`.
    pub fn split(mut self, index: usize) -> (Listpack, Listpack) {
        assert!(index <= self.len(), "listpack split out of range");
        let off = self.byte_offset(index);
        let right_data = self.data.split_off(off);
        let right_count = self.count - index as u32;
        self.count = index as u32;
        (self, Listpack::from_raw_parts(right_data, right_count))
    }

    /// Concatenate two listpacks.
    pub fn merge(mut left: Listpack, mut right: Listpack) -> Listpack {
        left.data.append(&mut right.data);
        left.count += right.count;
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut lp = Listpack::new();
        lp.push_tail(b"alpha");
        lp.push_tail(b"beta");
        lp.push_head(b"omega");
        assert_eq!(lp.len(), 3);
        assert_eq!(lp.get(0), LpValue::Bytes(b"omega"));
        assert_eq!(lp.get(1), LpValue::Bytes(b"alpha"));
        assert_eq!(lp.get(2), LpValue::Bytes(b"beta"));
    }

    #[test]
    fn test_integer_encoding() {
        let mut lp = Listpack::new();
        lp.push_tail(b"12345");
        lp.push_tail(b"-7");
        lp.push_tail(b"007"); // not canonical, stays a string
        lp.push_tail(b"9223372036854775807");
        assert_eq!(lp.get(0), LpValue::Int(12345));
        assert_eq!(lp.get(1), LpValue::Int(-7));
        assert_eq!(lp.get(2), LpValue::Bytes(b"007"));
        assert_eq!(lp.get(3), LpValue::Int(i64::MAX));
        assert!(lp.get(0).eq_bytes(b"12345"));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut lp = Listpack::new();
        lp.push_tail(b"a");
        lp.push_tail(b"c");
        lp.insert(1, b"b");
        assert_eq!(lp.get(1), LpValue::Bytes(b"b"));
        assert_eq!(lp.len(), 3);
        lp.remove(0);
        assert_eq!(lp.get(0), LpValue::Bytes(b"b"));
        assert_eq!(lp.len(), 2);
    }

    #[test]
    fn test_remove_range() {
        let mut lp = Listpack::new();
        for i in 0..10 {
            lp.push_tail(format!("e{i}").as_bytes());
        }
        lp.remove_range(2, 5);
        assert_eq!(lp.len(), 5);
        assert_eq!(lp.get(2), LpValue::Bytes(b"e7"));
    }

    #[test]
    fn test_replace_changes_size_class() {
        let mut lp = Listpack::new();
        lp.push_tail(b"tiny");
        lp.push_tail(b"middle");
        lp.replace(0, b"a-much-longer-element-than-before");
        assert_eq!(lp.get(0), LpValue::Bytes(b"a-much-longer-element-than-before"));
        assert_eq!(lp.get(1), LpValue::Bytes(b"middle"));
        lp.replace(0, b"5");
        assert_eq!(lp.get(0), LpValue::Int(5));
    }

    #[test]
    fn test_split_and_merge_round_trip() {
        let mut lp = Listpack::new();
        for i in 0..8 {
            lp.push_tail(format!("v{i}").as_bytes());
        }
        let (left, right) = lp.split(3);
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 5);
        assert_eq!(left.get(2), LpValue::Bytes(b"v2"));
        assert_eq!(right.get(0), LpValue::Bytes(b"v3"));

        let merged = Listpack::merge(left, right);
        assert_eq!(merged.len(), 8);
        for i in 0..8 {
            assert!(merged.get(i).eq_bytes(format!("v{i}").as_bytes()));
        }
    }

    #[test]
    fn test_split_at_ends() {
        let mut lp = Listpack::new();
        lp.push_tail(b"x");
        lp.push_tail(b"y");
        let (l, r) = lp.clone().split(0);
        assert_eq!((l.len(), r.len()), (0, 2));
        let (l, r) = lp.split(2);
        assert_eq!((l.len(), r.len()), (2, 0));
    }
}
