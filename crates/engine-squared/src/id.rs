//! Strongly typed identifiers.
//!
//! [`Id<Tag>`] keeps ids of different kinds from being mixed up at compile
//! time. [`StringId`] is a hashed name: cheap to compare, still printable.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `u32` identifier tagged with the kind of thing it names.
pub struct Id<Tag> {
    value: u32,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> Id<Tag> {
    pub const NULL: Self = Self::new(u32::MAX);

    pub const fn new(value: u32) -> Self {
        Self {
            value,
            _tag: PhantomData,
        }
    }

    pub const fn value(self) -> u32 {
        self.value
    }

    pub const fn is_null(self) -> bool {
        self.value == u32::MAX
    }
}

// Manual impls: derives would require `Tag` itself to implement each trait.
impl<Tag> Clone for Id<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Copy for Id<Tag> {}

impl<Tag> PartialEq for Id<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<Tag> Eq for Id<Tag> {}

impl<Tag> PartialOrd for Id<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for Id<Tag> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<Tag> Hash for Id<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag> Default for Id<Tag> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<Tag> fmt::Debug for Id<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Id(null)")
        } else {
            write!(f, "Id({})", self.value)
        }
    }
}

impl<Tag> fmt::Display for Id<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<Tag> Serialize for Id<Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.value)
    }
}

impl<'de, Tag> Deserialize<'de> for Id<Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::new)
    }
}

/// A name hashed with 32-bit FNV-1a. Equality and hashing only look at the
/// hash.
#[derive(Clone)]
pub struct StringId {
    hash: u32,
    name: String,
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

impl StringId {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: fnv1a(name.as_bytes()),
            name,
        }
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for StringId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq for StringId {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for StringId {}

impl Hash for StringId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({:?}, {:#010x})", self.name, self.hash)
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for StringId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for StringId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Texture;
    struct Mesh;

    #[test]
    fn typed_ids_compare_by_value() {
        let a: Id<Texture> = Id::new(3);
        let b: Id<Texture> = Id::new(3);
        assert_eq!(a, b);
        assert!(Id::<Texture>::new(1) < a);
        assert!(!a.is_null());
        assert!(Id::<Mesh>::default().is_null());
        assert_eq!(format!("{:?}", Id::<Mesh>::NULL), "Id(null)");
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn string_ids_hash_the_name() {
        let a = StringId::new("player");
        let b: StringId = "player".into();
        assert_eq!(a, b);
        assert_eq!(a.hash(), fnv1a(b"player"));
        assert_eq!(a.to_string(), "player");
        assert_ne!(a, StringId::new("enemy"));
    }

    #[test]
    fn serde_round_trips_as_plain_values() {
        let json = serde_json::to_string(&Id::<Mesh>::new(7)).unwrap();
        assert_eq!(json, "7");
        let name: StringId = serde_json::from_str("\"camera\"").unwrap();
        assert_eq!(name.as_str(), "camera");
    }
}
