//! Movement-type flag set shared by the mobile state machine and observers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// What kind of displacement an actor underwent during the last tick.
///
/// Derived from the actual change in world position and facing, never from
/// intent: an actor that wants to move but is blocked reports `NONE`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementType(u8);

impl MovementType {
    pub const NONE:       MovementType = MovementType(0);
    /// Ground-plane (x/y) displacement.
    pub const HORIZONTAL: MovementType = MovementType(1 << 0);
    /// Height (z) displacement.
    pub const VERTICAL:   MovementType = MovementType(1 << 1);
    /// Facing changed.
    pub const TURN:       MovementType = MovementType(1 << 2);

    #[inline]
    pub fn contains(self, other: MovementType) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if the actor changed position (horizontally or vertically).
    #[inline]
    pub fn is_displacing(self) -> bool {
        self.0 & (Self::HORIZONTAL.0 | Self::VERTICAL.0) != 0
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for MovementType {
    type Output = MovementType;
    #[inline]
    fn bitor(self, rhs: MovementType) -> MovementType {
        MovementType(self.0 | rhs.0)
    }
}

impl BitOrAssign for MovementType {
    #[inline]
    fn bitor_assign(&mut self, rhs: MovementType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut sep = "";
        for (flag, name) in [
            (Self::HORIZONTAL, "horizontal"),
            (Self::VERTICAL, "vertical"),
            (Self::TURN, "turn"),
        ] {
            if self.contains(flag) {
                write!(f, "{sep}{name}")?;
                sep = "|";
            }
        }
        Ok(())
    }
}
