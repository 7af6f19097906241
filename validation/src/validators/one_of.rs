use crate::schema::macros::impl_validator_settings;
use crate::validators::{Settings, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};

/// A stateful validator that checks if a string is in a predefined set.
#[derive(Clone, Debug)]
pub struct OneOf {
    valid_strings: Vec<String>,
    settings: Settings,
}

impl OneOf {
    pub(crate) fn new(valid_strings: Vec<String>) -> Self {
        Self {
            valid_strings,
            settings: Settings::default(),
        }
    }

    /// Example: `OneOf::in_list(&["a", "b", "c"])`
    pub fn in_list(valid_strings: &[&str]) -> Self {
        Self::new(valid_strings.iter().map(|s| s.to_string()).collect())
    }

    pub fn valid_strings(&self) -> &[String] {
        &self.valid_strings
    }

    pub(crate) fn allows(&self, value: &str) -> bool {
        self.valid_strings.iter().any(|s| s == value)
    }
}

impl_validator_settings!(OneOf, negatable);

impl Validator<String> for OneOf {
    fn do_validate(
        &self,
        subject: &String,
        _current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        if self.allows(subject.trim()) == self.settings.negated {
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
        Some(format!(
            "String must {}be one of: {}",
            not,
            self.valid_strings.join(", ")
        ))
    }

    fn tag(&self) -> Option<&str> {
        self.settings.tag.as_deref()
    }
}

impl Display for OneOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.valid_strings.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_list() {
        let validator = OneOf::in_list(&["good", "values", "default"]);

        for ok in ["good", "values", " default "] {
            assert!(validator.validate(&ok.to_string()).unwrap().is_valid());
        }
        for bad in ["bad", "inputs", "DEFAULT"] {
            let results = validator.validate(&bad.to_string()).unwrap();
            assert_eq!(
                results.messages(),
                vec!["String must be one of: good, values, default"]
            );
        }
    }

    #[test]
    fn test_negated() {
        let validator = OneOf::in_list(&["root", "admin"]).negated();

        assert!(validator.validate(&"guest".to_string()).unwrap().is_valid());
        let results = validator.validate(&"root".to_string()).unwrap();
        assert_eq!(
            results.messages(),
            vec!["String must not be one of: root, admin"]
        );
    }
}
