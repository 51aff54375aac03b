//! Fixed-point math utilities for deterministic simulation.
//!
//! Fighter physics runs entirely on fixed-point numbers so that a frame
//! sequence is bit-reproducible: two runs fed the same inputs, or a run
//! resumed from a snapshot, land on exactly the same positions.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Largest magnitude a position or config quantity may take.
///
/// Positions beyond it mean the simulation has gone wrong. Config values are
/// held to it too, so a frame of arithmetic on them stays inside `Fixed`.
pub const POSITION_LIMIT: i32 = 1 << 20;

/// A fixed-point `{x, y}` pair used for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coords {
    /// X coordinate (grows rightwards).
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (grows downwards, canvas convention).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for human-edited fixed-point values.
///
/// Config files write `gravity: 0.7`, not raw bits. Values are read as
/// decimals and converted once, at load time, so the simulation itself
/// never touches floating point.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is not representable")))
    }
}

/// Serde support for human-edited coordinate pairs, written as `(x, y)`.
pub mod coords_decimal {
    use super::{Coords, Fixed};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a pair as a decimal tuple.
    pub fn serialize<S>(value: &Coords, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (value.x.to_num::<f64>(), value.y.to_num::<f64>()).serialize(serializer)
    }

    /// Deserialize a decimal tuple into a pair.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Coords, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y) = <(f64, f64)>::deserialize(deserializer)?;
        match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
            (Some(x), Some(y)) => Ok(Coords::new(x, y)),
            _ => Err(D::Error::custom(format!("({x}, {y}) is not representable"))),
        }
    }
}

impl Coords {
    /// Create a new pair.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a pair from integer components.
    #[must_use]
    pub fn from_int(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

}

impl std::ops::Add for Coords {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Coords {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub position: Coords,
    /// Width in arena units.
    #[serde(with = "fixed_serde")]
    pub width: Fixed,
    /// Height in arena units.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(position: Coords, width: Fixed, height: Fixed) -> Self {
        Self {
            position,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> Fixed {
        self.position.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> Fixed {
        self.position.y + self.height
    }

    /// Inclusive overlap test on both axes.
    ///
    /// Touching edges count as overlapping, so a box whose right edge sits
    /// exactly on another's left edge still registers.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right() >= other.position.x
            && self.position.x <= other.right()
            && self.bottom() >= other.position.y
            && self.position.y <= other.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect::new(Coords::from_int(x, y), Fixed::from_num(w), Fixed::from_num(h))
    }

    #[test]
    fn test_coords_add_sub() {
        let a = Coords::from_int(3, -2);
        let b = Coords::from_int(1, 5);
        assert_eq!(a + b, Coords::from_int(4, 3));
        assert_eq!(a - b, Coords::from_int(2, -7));
    }

    #[test]
    fn test_fixed_determinism() {
        let gravity = Fixed::from_num(7) / Fixed::from_num(10);
        let mut a = Fixed::ZERO;
        let mut b = Fixed::ZERO;
        for _ in 0..1000 {
            a += gravity;
            b += gravity;
        }
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_rect_overlap_inclusive_edges() {
        let a = rect(0, 0, 100, 50);
        let touching = rect(100, 0, 50, 150);
        let apart = rect(101, 0, 50, 150);
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_rect_overlap_requires_both_axes() {
        let a = rect(0, 0, 100, 50);
        let below = rect(20, 51, 50, 150);
        assert!(!a.overlaps(&below));
        let inside_vertically = rect(20, 50, 50, 150);
        assert!(a.overlaps(&inside_vertically));
    }

    #[test]
    fn test_decimal_serde_round_trip_is_stable() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "fixed_decimal")]
            value: Fixed,
        }

        let parsed: Wrapper = ron::from_str("(value: 0.7)").unwrap();
        let again: Wrapper = ron::from_str("(value: 0.7)").unwrap();
        assert_eq!(parsed.value, again.value);
        assert!(parsed.value > Fixed::from_num(0.69) && parsed.value < Fixed::from_num(0.71));
    }
}
