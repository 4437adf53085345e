use std::fmt::Display;

use serde::Serialize;

use crate::error::CoreError;

/// Scalar usable as a range bound. Bounds must be non-negative and finite.
pub trait RangeBound: Copy + PartialOrd + Display {
    fn is_valid_bound(self) -> bool;

    /// Collapses values that compare equal but print differently.
    fn normalized(self) -> Self {
        self
    }
}

impl RangeBound for i64 {
    fn is_valid_bound(self) -> bool {
        self >= 0
    }
}

impl RangeBound for f64 {
    fn is_valid_bound(self) -> bool {
        self.is_finite() && self >= 0.0
    }

    /// `-0.0 + 0.0` is `+0.0`; every other value is unchanged.
    fn normalized(self) -> Self {
        self + 0.0
    }
}

/// Inclusive range with optional ends. At least one end is always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: RangeBound> ValueRange<T> {
    /// Returns `Ok(None)` when neither end is supplied.
    pub fn from_bounds(
        field: &'static str,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<Option<Self>, CoreError> {
        let (min, max) = (min.map(T::normalized), max.map(T::normalized));
        for bound in [min, max].into_iter().flatten() {
            if !bound.is_valid_bound() {
                return Err(CoreError::InvalidRange(format!(
                    "{field} bound {bound} must be a non-negative number"
                )));
            }
        }
        match (min, max) {
            (None, None) => Ok(None),
            (Some(min), Some(max)) if min > max => Err(CoreError::InvalidRange(format!(
                "{field} min {min} is greater than max {max}"
            ))),
            (min, max) => Ok(Some(Self { min, max })),
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_bound_reads_as_zero() {
        let range = ValueRange::from_bounds("area", Some(-0.0_f64), None)
            .unwrap()
            .unwrap();
        let min = range.min.unwrap();
        assert!(min.is_sign_positive());
        assert_eq!(min.to_string(), "0");
    }

    #[test]
    fn absent_bounds_yield_no_range() {
        let range = ValueRange::<i64>::from_bounds("price", None, None).unwrap();
        assert!(range.is_none());
    }

    #[test]
    fn open_ended_range_checks_one_side() {
        let range = ValueRange::from_bounds("price", Some(100_i64), None)
            .unwrap()
            .unwrap();
        assert!(range.contains(100));
        assert!(range.contains(5_000));
        assert!(!range.contains(99));
    }

    #[test]
    fn closed_range_is_inclusive() {
        let range = ValueRange::from_bounds("area", Some(30.0), Some(60.0))
            .unwrap()
            .unwrap();
        assert!(range.contains(30.0));
        assert!(range.contains(60.0));
        assert!(!range.contains(60.5));
    }

    #[test]
    fn reject_inverted_range() {
        let err = ValueRange::from_bounds("price", Some(10_i64), Some(5)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange(_)));
    }

    #[test]
    fn reject_negative_and_nan_bounds() {
        assert!(ValueRange::from_bounds("price", Some(-1_i64), None).is_err());
        assert!(ValueRange::from_bounds("area", None, Some(f64::NAN)).is_err());
    }
}
