use std::fmt;

use num_bigint::BigUint;

/// An affine curve point or the distinguished point at infinity.
///
/// Immutable value type; the engines never mutate operands, they always
/// produce fresh points.
#[derive(Clone, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    pub fn affine(x: BigUint, y: BigUint) -> Self {
        Point::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    /// Coordinates of a finite point, `None` for infinity.
    pub fn xy(&self) -> Option<(&BigUint, &BigUint)> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, y } => Some((x, y)),
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => write!(f, "Point::Infinity"),
            Point::Affine { x, y } => f
                .debug_struct("Point")
                .field("x", &x.to_str_radix(16))
                .field("y", &y.to_str_radix(16))
                .finish(),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => write!(f, "(infinity)"),
            Point::Affine { x, y } => write!(f, "({:#x}, {:#x})", x, y),
        }
    }
}
