use crate::schema::macros::impl_validator_settings;
use crate::validators::{Settings, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};

/// Bounds the number of characters in a string. Both bounds are inclusive.
#[derive(Clone, Debug)]
pub struct StringLength {
    min: usize,
    max: Option<usize>,
    settings: Settings,
}

impl StringLength {
    pub fn at_least(min: usize) -> Self {
        Self::between_opt(min, None)
    }

    pub fn at_most(max: usize) -> Self {
        Self::between_opt(0, Some(max))
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::between_opt(min, Some(max))
    }

    fn between_opt(min: usize, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            settings: Settings::default(),
        }
    }
}

impl_validator_settings!(StringLength, negatable);

impl Validator<String> for StringLength {
    fn do_validate(
        &self,
        subject: &String,
        _current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        let length = subject.chars().count();
        let fits = length >= self.min && self.max.is_none_or(|max| length <= max);
        if fits == self.settings.negated {
            let default = self.default_message_template().unwrap_or_default();
            self.settings.log(self, &default, subject, key, results);
        }
        Ok(())
    }

    fn message_template(&self) -> Option<&str> {
        self.settings.message.as_deref()
    }

    fn default_message_template(&self) -> Option<String> {
        let not = if self.settings.negated { "not " } else { "" };
        let expectation = match self.max {
            Some(max) => format!("between {} and {}", self.min, max),
            None => format!("at least {}", self.min),
        };
        Some(format!(
            "The length of '{{value}}' must {}be {} characters",
            not, expectation
        ))
    }

    fn tag(&self) -> Option<&str> {
        self.settings.tag.as_deref()
    }
}

impl Display for StringLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "length [{}, ..., {}]", self.min, max),
            None => write!(f, "length [{}, ...]", self.min),
        }
    }
}
