use crate::schema::macros::impl_validator_settings;
use crate::validators::{Settings, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};

/// Checks that a string contains a fragment, or with `negated()` that it does not.
#[derive(Clone, Debug)]
pub struct Substring {
    fragment: String,
    settings: Settings,
}

impl Substring {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            settings: Settings::default(),
        }
    }
}

impl_validator_settings!(Substring, negatable);

impl Validator<String> for Substring {
    fn do_validate(
        &self,
        subject: &String,
        _current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        if subject.contains(self.fragment.as_str()) == self.settings.negated {
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
        Some(format!("'{{value}}' must {}contain '{}'", not, self.fragment))
    }

    fn tag(&self) -> Option<&str> {
        self.settings.tag.as_deref()
    }
}

impl Display for Substring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.settings.negated {
            write!(f, "not contains '{}'", self.fragment)
        } else {
            write!(f, "contains '{}'", self.fragment)
        }
    }
}
