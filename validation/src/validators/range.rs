use crate::schema::macros::impl_validator_settings;
use crate::validators::{Settings, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};

/// A stateful validator for numeric ranges. Both bounds are inclusive.
#[derive(Clone, Debug)]
pub struct Range {
    min: Option<f64>,
    max: Option<f64>,
    settings: Settings,
}

impl Range {
    fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            settings: Settings::default(),
        }
    }

    pub fn at_least(min: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), None)
    }

    pub fn at_most(max: impl Into<f64>) -> Self {
        Self::new(None, Some(max.into()))
    }

    pub fn between(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), Some(max.into()))
    }

    fn contains(&self, n: f64) -> bool {
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

impl_validator_settings!(Range, negatable);

/// Numeric subjects a [`Range`] can check.
///
/// Values are compared as `f64`, so integers beyond 2^53 lose precision near the bounds.
pub trait RangeValue: Copy + Display + 'static {
    fn as_f64(self) -> f64;
}

macro_rules! impl_range_value {
    ($($t:ty),*) => {
        $(
            impl RangeValue for $t {
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_range_value!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl<T: RangeValue> Validator<T> for Range {
    fn do_validate(
        &self,
        subject: &T,
        _current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        if self.contains(subject.as_f64()) == self.settings.negated {
            let default = Validator::<T>::default_message_template(self).unwrap_or_default();
            self.settings.log(self, &default, subject, key, results);
        }
        Ok(())
    }

    fn message_template(&self) -> Option<&str> {
        self.settings.message.as_deref()
    }

    fn default_message_template(&self) -> Option<String> {
        let expectation = match (self.min, self.max) {
            (None, None) => "be a number".to_string(),
            (Some(min), None) => format!("be at least {}", min),
            (None, Some(max)) => format!("be no more than {}", max),
            (Some(min), Some(max)) => format!("be between {} and {}", min, max),
        };
        let not = if self.settings.negated { "not " } else { "" };
        Some(format!("Value {{value}} must {}{}", not, expectation))
    }

    fn tag(&self) -> Option<&str> {
        self.settings.tag.as_deref()
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => write!(f, "[...]"),
            (None, Some(max)) => write!(f, "[..., {}]", max),
            (Some(min), None) => write!(f, "[{}, ...]", min),
            (Some(min), Some(max)) => write!(f, "[{}, ..., {}]", min, max),
        }
    }
}
