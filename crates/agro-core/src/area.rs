//! # Area Module
//!
//! Provides the `Area` type for land measurements.
//!
//! ## Why Integer Area?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Farm declares: total 0.3 ha, agricultural 0.1 ha, vegetation 0.2 ha   │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004 > 0.3  ❌ REJECTED!                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer hundredths of a hectare                          │
//! │    10 + 20 = 30 <= 30                      ✅ ACCEPTED                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the wire an area is a plain JSON number of hectares (`150.25`).
//! Inside the system, and in the database, it is an `i64` count of
//! hundredths of a hectare (`15025`).
//!
//! ## Usage
//! ```rust
//! use agro_core::area::Area;
//!
//! let total = Area::from_hectares(100.0).unwrap();
//! let used = Area::from_hundredths(7_000) + Area::from_hundredths(3_000);
//! assert!(used <= total);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Largest magnitude (in hundredths) that survives an exact f64 round trip.
const MAX_EXACT_HUNDREDTHS: f64 = 9_000_000_000_000_000.0;

// =============================================================================
// Area Type
// =============================================================================

/// A land area in hundredths of a hectare.
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values are representable so validation can
///   report them instead of failing to parse
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde as hectares**: API consumers never see the internal unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Area(i64);

impl Area {
    /// Creates an area from hundredths of a hectare.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Area(hundredths)
    }

    /// Creates an area from a hectare value, rounding to two decimals.
    ///
    /// Returns `None` for NaN, infinities and magnitudes that cannot be
    /// represented exactly.
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::area::Area;
    ///
    /// assert_eq!(Area::from_hectares(12.345).unwrap().hundredths(), 1235);
    /// assert!(Area::from_hectares(f64::NAN).is_none());
    /// ```
    pub fn from_hectares(hectares: f64) -> Option<Self> {
        if !hectares.is_finite() {
            return None;
        }

        let scaled = (hectares * 100.0).round();
        if scaled.abs() > MAX_EXACT_HUNDREDTHS {
            return None;
        }

        Some(Area(scaled as i64))
    }

    /// Returns the value in hundredths of a hectare.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the value in hectares (for display and serialization).
    #[inline]
    pub fn hectares(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero area.
    #[inline]
    pub const fn zero() -> Self {
        Area(0)
    }

    /// Checks if the area is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two areas, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Area(sum)),
            None => None,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02} ha", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Area {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Area(self.0 + other.0)
    }
}

impl AddAssign for Area {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Area {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Area::zero(), Add::add)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Area {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.hectares())
    }
}

impl<'de> Deserialize<'de> for Area {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hectares = f64::deserialize(deserializer)?;
        Area::from_hectares(hectares).ok_or_else(|| {
            serde::de::Error::custom(format!("area {} is not a representable number of hectares", hectares))
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
