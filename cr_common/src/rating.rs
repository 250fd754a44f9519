use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// Rating every player starts with (3.00 display points).
pub const STARTING_RATING: Rating = Rating(300);
/// Ratings never drop below this after settlement (1.00 display points).
pub const RATING_FLOOR: Rating = Rating(100);
/// Ratings never rise above this after settlement (5.00 display points).
pub const RATING_CEILING: Rating = Rating(500);

//--------------------------------------      Rating       -----------------------------------------------------------
/// A player rating in centi-points. `Rating(300)` displays as `3.00`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rating(i64);

impl Add for Rating {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Rating {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Rating {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Rating {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Rating {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Rating {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a rating: {0}")]
pub struct RatingConversionError(String);

impl From<i64> for Rating {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rating {
    type Error = RatingConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RatingConversionError(format!("Value {value} is too large to convert to Rating")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pts = self.0 as f64 / 100.0;
        write!(f, "{pts:0.2}")
    }
}

impl Rating {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_points(points: i64) -> Self {
        Self(points * 100)
    }

    /// Absolute distance between two ratings, in centi-points.
    pub fn gap(&self, other: &Self) -> i64 {
        (self.0 - other.0).abs()
    }

    /// Clamp into the settlement band `[RATING_FLOOR, RATING_CEILING]`.
    pub fn clamped(self) -> Self {
        Self(self.0.clamp(RATING_FLOOR.0, RATING_CEILING.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_is_two_decimal_points() {
        assert_eq!(Rating::from(300).to_string(), "3.00");
        assert_eq!(Rating::from(415).to_string(), "4.15");
        assert_eq!(Rating::from(99).to_string(), "0.99");
    }

    #[test]
    fn clamping() {
        assert_eq!(Rating::from(501).clamped(), RATING_CEILING);
        assert_eq!(Rating::from(42).clamped(), RATING_FLOOR);
        assert_eq!(Rating::from(300).clamped(), STARTING_RATING);
    }

    #[test]
    fn arithmetic() {
        let a = Rating::from(310);
        let b = Rating::from(15);
        assert_eq!(a + b, Rating::from(325));
        assert_eq!(a - b, Rating::from(295));
        assert_eq!(-b, Rating::from(-15));
        assert_eq!(a.gap(&b), 295);
        assert_eq!(b.gap(&a), 295);
    }
}
