//! Named bit-set classes: crush classes and damage types.
//!
//! Class names are interned once at load time by a [`ClassRegistry`]; the
//! hot paths (crush checks run for every cell entry) only ever compare
//! `u64` masks.

use std::fmt;
use std::marker::PhantomData;

use crate::{CoreError, CoreResult};

/// Maximum distinct names per registry (one bit each).
const MAX_CLASSES: usize = 64;

/// Marker for crush-class sets.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum CrushClass {}

/// Marker for damage-type sets.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DamageType {}

/// Kind-tagged bit-set.  The marker keeps crush classes and damage types
/// from being mixed up at compile time.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(bound = ""))]
pub struct ClassSet<K> {
    bits:  u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    _kind: PhantomData<fn() -> K>,
}

pub type CrushClasses = ClassSet<CrushClass>;
pub type DamageTypes  = ClassSet<DamageType>;

impl<K> ClassSet<K> {
    pub const EMPTY: ClassSet<K> = ClassSet { bits: 0, _kind: PhantomData };

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits, _kind: PhantomData }
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.bits
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn intersects(self, other: ClassSet<K>) -> bool {
        self.bits & other.bits != 0
    }

    #[inline]
    pub fn union(self, other: ClassSet<K>) -> ClassSet<K> {
        Self::from_bits(self.bits | other.bits)
    }

    #[inline]
    pub fn contains_bit(self, bit: u8) -> bool {
        bit < 64 && self.bits & (1 << bit) != 0
    }

    /// Set bit indices in ascending order.
    pub fn iter_bits(self) -> impl Iterator<Item = u8> {
        (0..64u8).filter(move |&b| self.contains_bit(b))
    }
}

// Manual impls keep these free of bounds on `K`.
impl<K> Clone for ClassSet<K> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<K> Copy for ClassSet<K> {}
impl<K> PartialEq for ClassSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}
impl<K> Eq for ClassSet<K> {}
impl<K> Default for ClassSet<K> {
    fn default() -> Self {
        Self::EMPTY
    }
}
impl<K> fmt::Debug for ClassSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassSet({:#x})", self.bits)
    }
}

// ── ClassRegistry ─────────────────────────────────────────────────────────────

/// Interns class names into bit positions.
///
/// One registry per kind; the same name always maps to the same bit for the
/// lifetime of the registry, in first-seen order.
pub struct ClassRegistry<K> {
    kind:  &'static str,
    names: Vec<String>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ClassRegistry<K> {
    /// `kind` is used only in error messages (e.g. `"crush class"`).
    pub fn new(kind: &'static str) -> Self {
        Self { kind, names: Vec::new(), _kind: PhantomData }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bit index of `name`, adding it if unseen.
    pub fn intern(&mut self, name: &str) -> CoreResult<u8> {
        if let Some(bit) = self.names.iter().position(|n| n == name) {
            return Ok(bit as u8);
        }
        if self.names.len() >= MAX_CLASSES {
            return Err(CoreError::ClassCapacity { kind: self.kind, max: MAX_CLASSES });
        }
        self.names.push(name.to_owned());
        Ok((self.names.len() - 1) as u8)
    }

    /// Bit index of an already-interned `name`.
    pub fn lookup(&self, name: &str) -> CoreResult<u8> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|b| b as u8)
            .ok_or_else(|| CoreError::UnknownClass { kind: self.kind, name: name.to_owned() })
    }

    /// Build a set from names, interning new ones.
    pub fn set_of<'a, I>(&mut self, names: I) -> CoreResult<ClassSet<K>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut bits = 0u64;
        for name in names {
            bits |= 1 << self.intern(name)?;
        }
        Ok(ClassSet::from_bits(bits))
    }

    /// Parse a `;`-separated list (`"infantry;wall"`).  Blank entries are
    /// skipped, so `""` is the empty set.
    pub fn parse_list(&mut self, list: &str) -> CoreResult<ClassSet<K>> {
        self.set_of(list.split(';').map(str::trim).filter(|s| !s.is_empty()))
    }

    /// Names in `set`, in bit order.  Bits with no registered name are
    /// skipped.
    pub fn names_of(&self, set: ClassSet<K>) -> Vec<&str> {
        set.iter_bits()
            .filter_map(|b| self.names.get(b as usize).map(String::as_str))
            .collect()
    }
}
