//! Bounds-checked scalar values
//!
//! A `ValueInRange` always satisfies `minimum <= current <= maximum`. Invalid
//! triples are rejected when constructed or assigned, never clamped.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Numeric types that can live in a `ValueInRange`
pub trait RangeValue: Copy + PartialOrd + std::fmt::Debug {
    /// Snap `value` to the nearest `minimum + k * step` not above `maximum`
    fn quantize(value: Self, minimum: Self, maximum: Self, step: Self) -> Self;

    /// Whether `self` is usable as a quantization step
    fn is_valid_step(self) -> bool;

    /// Whether the value takes part in ordering at all (rejects NaN)
    fn is_comparable(self) -> bool {
        self.partial_cmp(&self).is_some()
    }
}

macro_rules! impl_range_value_int {
    ($($t:ty),*) => {$(
        impl RangeValue for $t {
            fn quantize(value: Self, minimum: Self, maximum: Self, step: Self) -> Self {
                // Widened so ranges reaching the type's limits cannot overflow
                let (value, minimum, maximum, step) =
                    (value as i128, minimum as i128, maximum as i128, step as i128);
                let k = (value - minimum + step / 2) / step;
                let snapped = minimum + k * step;
                let snapped = if snapped > maximum { snapped - step } else { snapped };
                // Always within [minimum, maximum], so the narrowing is lossless
                snapped as Self
            }

            fn is_valid_step(self) -> bool {
                self > 0
            }
        }
    )*};
}

macro_rules! impl_range_value_float {
    ($($t:ty),*) => {$(
        impl RangeValue for $t {
            fn quantize(value: Self, minimum: Self, maximum: Self, step: Self) -> Self {
                let k = ((value - minimum) / step).round();
                let snapped = minimum + k * step;
                if snapped > maximum { snapped - step } else { snapped.max(minimum) }
            }

            fn is_valid_step(self) -> bool {
                self.is_finite() && self > 0.0
            }
        }
    )*};
}

impl_range_value_int!(i32, i64, u32, u64, usize);
impl_range_value_float!(f32, f64);

/// A scalar constrained to `[minimum, maximum]`, optionally quantized by `step`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueInRange<T> {
    minimum: T,
    maximum: T,
    current: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<T>,
}

impl<T: RangeValue> ValueInRange<T> {
    /// Create a range without quantization
    pub fn new(minimum: T, maximum: T, current: T) -> Result<Self, ConfigError> {
        Self::build(minimum, maximum, current, None)
    }

    /// Create a range whose current value snaps to `minimum + k * step`
    pub fn with_step(minimum: T, maximum: T, current: T, step: T) -> Result<Self, ConfigError> {
        Self::build(minimum, maximum, current, Some(step))
    }

    fn build(minimum: T, maximum: T, current: T, step: Option<T>) -> Result<Self, ConfigError> {
        if !minimum.is_comparable() || !maximum.is_comparable() || minimum > maximum {
            return Err(ConfigError::InvertedRange {
                minimum: format!("{minimum:?}"),
                maximum: format!("{maximum:?}"),
            });
        }
        if let Some(step) = step {
            if !step.is_valid_step() {
                return Err(ConfigError::InvalidStep(format!("{step:?}")));
            }
        }

        let mut range = Self {
            minimum,
            maximum,
            current: minimum,
            step,
        };
        range.set_current(current)?;
        Ok(range)
    }

    /// For literal bounds known to be valid at compile time
    pub(crate) const fn new_unchecked(minimum: T, maximum: T, current: T, step: Option<T>) -> Self {
        Self {
            minimum,
            maximum,
            current,
            step,
        }
    }

    #[inline]
    pub fn minimum(&self) -> T {
        self.minimum
    }

    #[inline]
    pub fn maximum(&self) -> T {
        self.maximum
    }

    #[inline]
    pub fn current(&self) -> T {
        self.current
    }

    #[inline]
    pub fn step(&self) -> Option<T> {
        self.step
    }

    /// Whether `value` could be assigned without error
    pub fn contains(&self, value: T) -> bool {
        self.minimum <= value && value <= self.maximum
    }

    /// Assign a new current value, quantized by the step if there is one.
    ///
    /// Fails without modifying `self` when the value is outside the range.
    pub fn set_current(&mut self, value: T) -> Result<(), ConfigError> {
        if !self.contains(value) {
            return Err(ConfigError::OutOfRange {
                minimum: format!("{:?}", self.minimum),
                maximum: format!("{:?}", self.maximum),
                current: format!("{value:?}"),
            });
        }
        self.current = match self.step {
            Some(step) => T::quantize(value, self.minimum, self.maximum, step),
            None => value,
        };
        Ok(())
    }

    /// Copy of this range with a different current value
    pub fn with_current(mut self, value: T) -> Result<Self, ConfigError> {
        self.set_current(value)?;
        Ok(self)
    }
}

/// Unvalidated wire form, checked by `ValueInRange::build` on the way in
#[derive(Deserialize)]
struct RawValueInRange<T> {
    minimum: T,
    maximum: T,
    current: T,
    step: Option<T>,
}

impl<'de, T> Deserialize<'de> for ValueInRange<T>
where
    T: RangeValue + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawValueInRange::<T>::deserialize(deserializer)?;
        Self::build(raw.minimum, raw.maximum, raw.current, raw.step)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range_keeps_values() {
        let range = ValueInRange::new(1, 16, 3).unwrap();
        assert_eq!(range.minimum(), 1);
        assert_eq!(range.maximum(), 16);
        assert_eq!(range.current(), 3);
        assert_eq!(range.step(), None);
    }

    #[test]
    fn test_violating_triples_rejected() {
        assert!(matches!(
            ValueInRange::new(1, 16, 0),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            ValueInRange::new(1.0_f32, 2.0, 2.5),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            ValueInRange::new(5, 1, 3),
            Err(ConfigError::InvertedRange { .. })
        ));
        assert!(ValueInRange::new(f32::NAN, 1.0, 0.5).is_err());
        assert!(ValueInRange::new(0.0, 1.0, f32::NAN).is_err());
    }

    #[test]
    fn test_failed_assignment_leaves_value() {
        let mut range = ValueInRange::new(0.0_f32, 1.2, 1.0).unwrap();
        assert!(range.set_current(1.3).is_err());
        assert_eq!(range.current(), 1.0);
        range.set_current(0.4).unwrap();
        assert_eq!(range.current(), 0.4);
    }

    #[test]
    fn test_int_step_quantization() {
        let mut range = ValueInRange::with_step(1, 10, 1, 3).unwrap();
        // Reachable values: 1, 4, 7, 10
        range.set_current(5).unwrap();
        assert_eq!(range.current(), 4);
        range.set_current(6).unwrap();
        assert_eq!(range.current(), 7);
        range.set_current(10).unwrap();
        assert_eq!(range.current(), 10);

        // Steps that overshoot the maximum round down instead
        let mut range = ValueInRange::with_step(0, 9, 0, 4).unwrap();
        range.set_current(9).unwrap();
        assert_eq!(range.current(), 8);
    }

    #[test]
    fn test_float_step_quantization() {
        let range = ValueInRange::with_step(0.0_f32, 1.0, 0.37, 0.25).unwrap();
        assert!((range.current() - 0.25).abs() < 1e-6);
        let range = ValueInRange::with_step(0.0_f32, 1.0, 0.9, 0.25).unwrap();
        assert!((range.current() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_step_rejected() {
        assert!(matches!(
            ValueInRange::with_step(0, 10, 5, 0),
            Err(ConfigError::InvalidStep(_))
        ));
        assert!(ValueInRange::with_step(0.0_f32, 1.0, 0.5, -0.1).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ValueInRange<u32> =
            serde_json::from_str(r#"{"minimum":1,"maximum":8,"current":4}"#).unwrap();
        assert_eq!(ok.current(), 4);

        let bad = serde_json::from_str::<ValueInRange<u32>>(
            r#"{"minimum":1,"maximum":8,"current":9}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_deserialize_without_step() {
        let range: ValueInRange<f32> =
            serde_json::from_str(r#"{"minimum":0.0,"maximum":1.2,"current":1.0}"#).unwrap();
        assert_eq!(range.step(), None);

        let stepped: ValueInRange<u32> =
            serde_json::from_str(r#"{"minimum":1,"maximum":10,"current":5,"step":3}"#).unwrap();
        assert_eq!(stepped.step(), Some(3));
        assert_eq!(stepped.current(), 4);
    }

    #[test]
    fn test_step_near_type_limits() {
        let mut range = ValueInRange::with_step(0u32, u32::MAX, 0, 10).unwrap();
        range.set_current(u32::MAX).unwrap();
        assert_eq!(range.current(), u32::MAX - u32::MAX % 10);

        let mut range = ValueInRange::with_step(i32::MIN, i32::MAX, 0, 1 << 30).unwrap();
        range.set_current(i32::MAX).unwrap();
        assert_eq!(range.current(), 1 << 30);
        range.set_current(i32::MIN).unwrap();
        assert_eq!(range.current(), i32::MIN);

        let mut range = ValueInRange::with_step(u64::MAX - 5, u64::MAX, u64::MAX, 4).unwrap();
        range.set_current(u64::MAX).unwrap();
        assert_eq!(range.current(), u64::MAX - 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ordered_triples_construct(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
                let mut v = [a, b, c];
                v.sort_unstable();
                let range = ValueInRange::new(v[0], v[2], v[1]).unwrap();
                prop_assert_eq!(range.minimum(), v[0]);
                prop_assert_eq!(range.maximum(), v[2]);
                prop_assert_eq!(range.current(), v[1]);
            }

            #[test]
            fn outside_values_fail(min in -100.0f32..0.0, max in 0.0f32..100.0, over in 0.001f32..50.0) {
                prop_assert!(ValueInRange::new(min, max, max + over).is_err());
                prop_assert!(ValueInRange::new(min, max, min - over).is_err());
            }

            #[test]
            fn stepped_values_stay_on_grid(value in 0u32..=100, step in 1u32..20) {
                let range = ValueInRange::with_step(0u32, 100, value, step).unwrap();
                prop_assert!(range.current() <= 100);
                prop_assert_eq!(range.current() % step, 0);
            }
        }
    }
}
