//! Cell and world coordinate types.
//!
//! # Two coordinate spaces
//!
//! - **Cells** (`CPos`) are the quantized grid used for occupancy, cost and
//!   blocking.  A cell carries a `layer` tag: `0` is the ground, anything
//!   else is a custom movement layer (bridge deck, tunnel, …).  Two cells with
//!   the same `(x, y)` on different layers are distinct positions.
//! - **World positions** (`WPos`) are integer world units, `CELL_SIZE` per
//!   cell edge.  They are the authoritative location of a moving actor; cells
//!   are their projection.
//!
//! All arithmetic is integer so every lockstep peer computes identical
//! results.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

/// World units per cell edge.
pub const CELL_SIZE: i32 = 1024;

/// World units per full turn of a [`WAngle`].
const FULL_TURN: i32 = 1024;

// ── CPos ──────────────────────────────────────────────────────────────────────

/// A grid cell on a given movement layer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CPos {
    pub x:     i32,
    pub y:     i32,
    pub layer: u8,
}

impl CPos {
    /// Ground-layer cell.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, layer: 0 }
    }

    #[inline]
    pub const fn with_layer(x: i32, y: i32, layer: u8) -> Self {
        Self { x, y, layer }
    }

    /// The same `(x, y)` on another layer.
    #[inline]
    pub const fn on_layer(self, layer: u8) -> Self {
        Self { layer, ..self }
    }

    #[inline]
    pub const fn is_ground(self) -> bool {
        self.layer == 0
    }

    /// `true` if `other` is one of the 8 neighbours (or the cell itself),
    /// ignoring layers.
    #[inline]
    pub fn is_adjacent_to(self, other: CPos) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl Add<CVec> for CPos {
    type Output = CPos;
    #[inline]
    fn add(self, v: CVec) -> CPos {
        CPos { x: self.x + v.x, y: self.y + v.y, layer: self.layer }
    }
}

impl Sub for CPos {
    type Output = CVec;
    #[inline]
    fn sub(self, rhs: CPos) -> CVec {
        CVec { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl fmt::Display for CPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.layer == 0 {
            write!(f, "({},{})", self.x, self.y)
        } else {
            write!(f, "({},{}@{})", self.x, self.y, self.layer)
        }
    }
}

// ── CVec ──────────────────────────────────────────────────────────────────────

/// A cell-space offset.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CVec {
    pub x: i32,
    pub y: i32,
}

impl CVec {
    pub const ZERO: CVec = CVec { x: 0, y: 0 };

    /// The 8 neighbour offsets in row-major order (top row first).
    pub const DIRECTIONS: [CVec; 8] = [
        CVec { x: -1, y: -1 },
        CVec { x:  0, y: -1 },
        CVec { x:  1, y: -1 },
        CVec { x: -1, y:  0 },
        CVec { x:  1, y:  0 },
        CVec { x: -1, y:  1 },
        CVec { x:  0, y:  1 },
        CVec { x:  1, y:  1 },
    ];

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length_squared(self) -> i32 {
        self.x * self.x + self.y * self.y
    }

    /// Both axes change: a diagonal step.
    #[inline]
    pub fn is_diagonal(self) -> bool {
        self.x != 0 && self.y != 0
    }
}

// ── WPos / WVec ───────────────────────────────────────────────────────────────

/// An absolute world position.  `z` is height above the ground plane.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WPos {
    pub const ZERO: WPos = WPos { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation `a + (b - a) * num / den`, computed in `i64`.
    ///
    /// `den == 0` returns `a`.
    pub fn lerp(a: WPos, b: WPos, num: i64, den: i64) -> WPos {
        if den == 0 {
            return a;
        }
        let l = |p: i32, q: i32| (p as i64 + (q as i64 - p as i64) * num / den) as i32;
        WPos { x: l(a.x, b.x), y: l(a.y, b.y), z: l(a.z, b.z) }
    }
}

impl Add<WVec> for WPos {
    type Output = WPos;
    #[inline]
    fn add(self, v: WVec) -> WPos {
        WPos { x: self.x + v.x, y: self.y + v.y, z: self.z + v.z }
    }
}

impl Sub for WPos {
    type Output = WVec;
    #[inline]
    fn sub(self, rhs: WPos) -> WVec {
        WVec { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl fmt::Display for WPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// A world-space offset.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WVec {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WVec {
    pub const ZERO: WVec = WVec { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn horizontal_length_squared(self) -> i64 {
        let (x, y) = (self.x as i64, self.y as i64);
        x * x + y * y
    }

    #[inline]
    pub fn length_squared(self) -> i64 {
        self.horizontal_length_squared() + (self.z as i64) * (self.z as i64)
    }

    /// Integer length (floor of the Euclidean norm).
    pub fn length(self) -> i64 {
        isqrt(self.length_squared())
    }

    /// Compass heading of the horizontal component.  The zero vector faces
    /// north.
    pub fn yaw(self) -> WAngle {
        WAngle::toward(self.x, self.y)
    }
}

impl Add for WVec {
    type Output = WVec;
    #[inline]
    fn add(self, v: WVec) -> WVec {
        WVec { x: self.x + v.x, y: self.y + v.y, z: self.z + v.z }
    }
}

impl Neg for WVec {
    type Output = WVec;
    #[inline]
    fn neg(self) -> WVec {
        WVec { x: -self.x, y: -self.y, z: -self.z }
    }
}

fn isqrt(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as i64;
    // Float seed, integer correction.
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

// ── WAngle ────────────────────────────────────────────────────────────────────

/// A quantized compass angle: 1024 steps per turn, `0` = north (−y),
/// `256` = east (+x), increasing clockwise.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WAngle(u16);

impl WAngle {
    pub const NORTH: WAngle = WAngle(0);
    pub const EAST:  WAngle = WAngle(256);
    pub const SOUTH: WAngle = WAngle(512);
    pub const WEST:  WAngle = WAngle(768);

    /// Wrap any integer into `0..1024`.
    #[inline]
    pub fn new(value: i32) -> Self {
        WAngle(value.rem_euclid(FULL_TURN) as u16)
    }

    #[inline]
    pub fn angle(self) -> i32 {
        self.0 as i32
    }

    /// Signed shortest rotation from `self` to `target`, in `-511..=512`.
    pub fn delta_to(self, target: WAngle) -> i32 {
        let d = (target.angle() - self.angle()).rem_euclid(FULL_TURN);
        if d > FULL_TURN / 2 { d - FULL_TURN } else { d }
    }

    /// Rotate toward `target` by at most `step` units.
    pub fn rotate_towards(self, target: WAngle, step: i32) -> WAngle {
        let d = self.delta_to(target);
        if d.abs() <= step {
            target
        } else {
            WAngle::new(self.angle() + step * d.signum())
        }
    }

    /// Heading of the offset `(dx, dy)` in world/cell space.
    ///
    /// Uses the octant approximation `atan(t) ≈ π/4·t + 0.273·t·(1 − t)`
    /// scaled to 1024 steps per turn, so the result is exact on the 8 grid
    /// directions and within one step elsewhere.
    pub fn toward(dx: i32, dy: i32) -> WAngle {
        if dx == 0 && dy == 0 {
            return WAngle::NORTH;
        }
        let east  = dx as i64;
        let north = -(dy as i64);
        let (ax, ay) = (east.abs(), north.abs());

        // Angle from the north axis inside one quadrant, 0..=256.
        let a = if ax <= ay {
            octant_atan(ax, ay)
        } else {
            256 - octant_atan(ay, ax)
        };

        let a = match (east >= 0, north >= 0) {
            (true, true)   => a,
            (true, false)  => 512 - a,
            (false, false) => 512 + a,
            (false, true)  => FULL_TURN as i64 - a,
        };
        WAngle::new(a as i32)
    }
}

/// `atan(n / d)` in angle units for `0 <= n <= d`, `d > 0`.
fn octant_atan(n: i64, d: i64) -> i64 {
    (128 * n * d + 44 * n * (d - n)) / (d * d)
}

impl fmt::Display for WAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°/1024", self.0)
    }
}

// ── SubCell ───────────────────────────────────────────────────────────────────

/// A slot inside a cell.
///
/// - `Invalid` is the failure sentinel returned when no slot is usable.
/// - `Any` is a query wildcard ("whichever slot").
/// - `FullCell` claims the whole cell and conflicts with every slot.
/// - `Index(n)` (`n >= 1`) is one of the map's fixed sub-positions.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubCell {
    #[default]
    Invalid,
    Any,
    FullCell,
    Index(u8),
}

impl SubCell {
    /// The first real sub-position.
    pub const FIRST: SubCell = SubCell::Index(1);

    /// `true` for `FullCell` and the numbered sub-positions.
    #[inline]
    pub fn is_concrete(self) -> bool {
        matches!(self, SubCell::FullCell | SubCell::Index(_))
    }

    /// Occupancy overlap test used by the index: equal slots overlap,
    /// `FullCell` overlaps everything, and an `Any` query matches all.
    #[inline]
    pub fn overlaps(self, query: SubCell) -> bool {
        self == query
            || self == SubCell::FullCell
            || query == SubCell::FullCell
            || query == SubCell::Any
    }
}

impl fmt::Display for SubCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubCell::Invalid  => f.write_str("invalid"),
            SubCell::Any      => f.write_str("any"),
            SubCell::FullCell => f.write_str("full"),
            SubCell::Index(i) => write!(f, "sub{i}"),
        }
    }
}
