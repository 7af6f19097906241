use crate::schema::macros::impl_validator_settings;
use crate::validators::one_of::OneOf;
use crate::validators::{Settings, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::collections::HashSet;
use std::fmt::{self, Display};

/// A stateful validator for lists of strings.
///
/// It can check for duplicate values, enforce a specific set of allowed values,
/// and control whether an empty list is permitted. Every problem found is reported,
/// in that order. A value outside the allowed set is reported with that value as the
/// record target; the other problems carry the whole list.
#[derive(Clone, Debug)]
pub struct ValidList {
    valid_string: OneOf,
    is_empty_allowed: bool,
    settings: Settings,
}

impl ValidList {
    fn new(valid_strings: Vec<String>, is_empty_allowed: bool) -> Self {
        Self {
            valid_string: OneOf::new(valid_strings),
            is_empty_allowed,
            settings: Settings::default(),
        }
    }

    /// Factory for creating a validator that allows any non-duplicate values.
    pub fn any_non_duplicate_values(is_empty_allowed: bool) -> Self {
        Self::new(Vec::new(), is_empty_allowed)
    }

    /// Creates a validator that ensures all values are in the given set.
    /// Allows empty lists by default.
    pub fn in_list(valid_strings: &[&str]) -> Self {
        Self::in_list_allow_empty(true, valid_strings)
    }

    pub fn in_list_allow_empty(is_empty_allowed: bool, valid_strings: &[&str]) -> Self {
        Self::new(
            valid_strings.iter().map(|s| s.to_string()).collect(),
            is_empty_allowed,
        )
    }

    fn log(
        &self,
        message: String,
        subject: &dyn Display,
        key: &str,
        results: &mut ValidationResults,
    ) {
        self.settings.log(self, &message, subject, key, results);
    }
}

impl_validator_settings!(ValidList);

/// Renders a list the way it was typed.
struct ListDisplay<'a>(&'a [String]);

impl Display for ListDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl Validator<Vec<String>> for ValidList {
    fn do_validate(
        &self,
        subject: &Vec<String>,
        _current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        let shown = ListDisplay(subject);
        let valid_strings = self.valid_string.valid_strings();

        if !self.is_empty_allowed && subject.is_empty() {
            let valid_values = if valid_strings.is_empty() {
                "any non-empty value".to_string()
            } else {
                self.to_string()
            };
            self.log(
                format!("'{{key}}' must not be empty. Valid values include: {}", valid_values),
                &shown,
                key,
                results,
            );
            return Ok(());
        }

        let unique: HashSet<&String> = subject.iter().collect();
        if unique.len() != subject.len() {
            self.log("'{key}' values must not be duplicated.".to_string(), &shown, key, results);
        }

        for value in subject {
            if value.is_empty() {
                self.log("'{key}' values must not be empty.".to_string(), &shown, key, results);
            } else if !valid_strings.is_empty() && !self.valid_string.allows(value) {
                self.log(
                    format!(
                        "Invalid value '{{value}}' for '{{key}}': String must be one of: {}",
                        valid_strings.join(", ")
                    ),
                    value,
                    key,
                    results,
                );
            }
        }

        Ok(())
    }

    fn message_template(&self) -> Option<&str> {
        self.settings.message.as_deref()
    }

    fn tag(&self) -> Option<&str> {
        self.settings.tag.as_deref()
    }
}

impl Display for ValidList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (empty {})",
            self.valid_string,
            if self.is_empty_allowed {
                "allowed"
            } else {
                "not allowed"
            }
        )
    }
}
