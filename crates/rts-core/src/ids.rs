//! Typed identifier wrappers.
//!
//! Every id is `Copy + Ord + Hash`; ordering by id is the stable iteration
//! order the lockstep simulation relies on.  The inner integer is `pub` for
//! direct SoA indexing, but `.index()` reads better at call sites.

use std::fmt;

/// Generate a typed id wrapper around an unsigned integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel for "no such id" (the inner type's maximum).
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(invalid)", stringify!($name))
                }
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an actor in SoA storage.  Stable for the lifetime of a world;
    /// killed actors keep their slot.
    pub struct ActorId(u32);
}

typed_id! {
    /// Index of a player (owner) in the player table.
    pub struct PlayerId(u16);
}

typed_id! {
    /// Index into a map's terrain-type list.  `INVALID` marks cells that carry
    /// no terrain, such as custom-layer cells that do not exist.
    pub struct TerrainIndex(u8);
}

typed_id! {
    /// Index of a locomotor in a world's locomotor set.
    pub struct LocomotorId(u16);
}
