//! # Value and Tuple types
//!
//! [`Value`] is the tagged union of scalar types the store can hold; a
//! [`Tuple`] is a fixed-arity, ordered sequence of values. Both implement
//! [`Ord`] so that `Value::cmp`/`Tuple::cmp` agree bit-for-bit with the
//! byte order [`crate::codec::encode_tuple`] produces — this is the
//! invariant the whole index-permutation scheme rests on.
//!
//! ## Usage
//!
//! ```rust
//! use hoply::value::{Value, Tuple};
//!
//! let tuple = Tuple::new(vec![
//!     Value::Text("hyperdev.fr".into()),
//!     Value::Int(42),
//! ]);
//! assert_eq!(tuple.arity(), 2);
//! ```

use std::cmp::Ordering;
use uuid::Uuid;

/// A single scalar value. Variant order below matches the type-tag order
/// in the wire format exactly (see `crate::codec`): `Null < Bytes < Text <
/// Int < Float < Bool < Uuid`. Keeping the two orders in lockstep is what
/// makes `encode(a) <= encode(b) <=> a <= b` hold.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bytes(Vec<u8>),
    Text(String),
    /// Signed integer. The wire format's big-int escape path covers
    /// magnitudes beyond 8 bytes in principle; this crate bounds integers
    /// to `i128` (see DESIGN.md for the open-question resolution).
    Int(i128),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bytes(_) => 1,
            Value::Text(_) => 2,
            Value::Int(_) => 3,
            Value::Float(_) => 4,
            Value::Bool(_) => 5,
            Value::Uuid(_) => 6,
        }
    }

    /// A human-readable type name, used in `UsageError` messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Sort/equality key for floats: the FoundationDB-style sign-bit-flip
    /// transform, expressed over the bit pattern rather than IEEE
    /// comparison semantics, so that `NaN` payloads are totally ordered
    /// and equality is bit-exact (required for `decode(encode(v)) == v`).
    fn float_key(f: f64) -> u64 {
        let bits = f.to_bits();
        if bits & (1 << 63) != 0 {
            !bits
        } else {
            bits | (1 << 63)
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => Value::float_key(*a).cmp(&Value::float_key(*b)),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => unreachable!("rank() partitions variants before this match runs"),
        })
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bytes(b) => b.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => Value::float_key(*f).hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Uuid(u) => u.hash(state),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bytes(b) => write!(f, "{b:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i128)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i as i128)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// A fixed-arity, ordered sequence of [`Value`]s. `Tuple`'s derived `Ord`
/// is element-wise over equal-length vectors, which is exactly the order
/// the tuple codec's concatenated encoding produces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tuple(Vec<Value>);

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Tuple(values)
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.0.get(i)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Reorder columns according to `perm`: `result[i] = self[perm[i]]`.
    pub fn permute(&self, perm: &[usize]) -> Tuple {
        Tuple(perm.iter().map(|&i| self.0[i].clone()).collect())
    }

    /// Inverse of `permute`: given `permuted = original.permute(perm)`,
    /// `permuted.unpermute(perm) == original`.
    pub fn unpermute(&self, perm: &[usize]) -> Tuple {
        let mut out = vec![Value::Null; self.0.len()];
        for (pos, &orig_col) in perm.iter().enumerate() {
            out[orig_col] = self.0[pos].clone();
        }
        Tuple(out)
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Tuple(values)
    }
}
