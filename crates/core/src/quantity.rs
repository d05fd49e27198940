//! Line Quantities

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Quantity of a single cart or order line, always within `1..=99`.
///
/// Every constructor clamps rather than rejects: values below the minimum become
/// 1, values above the maximum become 99, and unparseable input becomes 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u8);

impl Quantity {
    /// Smallest quantity a line can hold.
    pub const MIN: Self = Self(1);

    /// Largest quantity a line can hold.
    pub const MAX: Self = Self(99);

    /// Clamp an arbitrary integer into range.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0));

        Self(u8::try_from(clamped).unwrap_or(Self::MIN.0))
    }

    /// Interpret free-form user input, e.g. the contents of a quantity field.
    ///
    /// Fractional input is truncated; anything non-numeric coerces to 1.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();

        if let Ok(value) = input.parse::<i64>() {
            return Self::clamped(value);
        }

        match input.parse::<f64>() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "value is clamped to 1..=99 immediately after truncation"
            )]
            Ok(value) if value.is_finite() => Self::clamped(value.trunc() as i64),
            _ => Self::MIN,
        }
    }

    /// Quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Add `delta` (which may be negative), clamping the result.
    #[must_use]
    pub fn offset(self, delta: i64) -> Self {
        Self::clamped(i64::from(self.0).saturating_add(delta))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<Quantity> for i32 {
    fn from(value: Quantity) -> Self {
        i32::from(value.0)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        u32::from(value.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;

        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is clamped to 1..=99 immediately after truncation"
        )]
        let quantity = if value.is_finite() {
            Self::clamped(value.trunc() as i64)
        } else {
            Self::MIN
        };

        Ok(quantity)
    }
}
