use getset::Getters;
use std::fmt::{self, Display};

/// A single rule violation.
///
/// The record owns plain text only. The originating validator is kept as its `Display`
/// rendering rather than a handle, so records stay `Clone + Eq`, can be compared
/// across runs and outlive the factory cache that produced them.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ValidationResult {
    /// Rendering of the offending value.
    target: String,
    key: String,
    message: String,
    tag: Option<String>,
    /// `Display` rendering of the validator that produced this record, e.g. `[10, ..., 20]`.
    validator: String,
}

impl ValidationResult {
    pub fn new(
        target: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
        tag: Option<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            key: key.into(),
            message: message.into(),
            tag,
            validator: validator.into(),
        }
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.key, self.message)
        }
    }
}

/// The sink validators write into.
///
/// Records keep their insertion order and are never removed; several validators may
/// append to the same sink during one run. The sink is not meant to be shared between
/// threads while a run is in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResults {
    results: Vec<ValidationResult>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    /// Formats `template` and appends the resulting record.
    pub fn log_failure(
        &mut self,
        validator: &dyn Display,
        template: &str,
        value: &dyn Display,
        key: &str,
        tag: Option<&str>,
    ) {
        let target = value.to_string();
        let message = format_message(template, &target, key, tag);
        self.push(ValidationResult::new(
            target,
            key,
            message,
            tag.map(String::from),
            validator.to_string(),
        ));
    }

    pub fn extend(&mut self, other: ValidationResults) {
        self.results.extend(other.results);
    }

    pub fn is_valid(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationResult> {
        self.results.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.message.as_str()).collect()
    }

    /// Records carrying `tag`, in insertion order.
    pub fn with_tag(&self, tag: &str) -> ValidationResults {
        self.filtered(|r| r.tag.as_deref() == Some(tag))
    }

    /// Records not carrying `tag`, in insertion order.
    pub fn without_tag(&self, tag: &str) -> ValidationResults {
        self.filtered(|r| r.tag.as_deref() != Some(tag))
    }

    fn filtered(&self, keep: impl Fn(&ValidationResult) -> bool) -> ValidationResults {
        ValidationResults {
            results: self.results.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ValidationResults {
    type Item = &'a ValidationResult;
    type IntoIter = std::slice::Iter<'a, ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for ValidationResults {
    type Item = ValidationResult;
    type IntoIter = std::vec::IntoIter<ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Substitutes `{value}`, `{key}` and `{tag}` in a message template.
///
/// The template is scanned once. Substituted text is never scanned again, so a value
/// containing `{key}` shows up as typed.
pub fn format_message(template: &str, value: &str, key: &str, tag: Option<&str>) -> String {
    let placeholders = [
        ("{value}", value),
        ("{key}", key),
        ("{tag}", tag.unwrap_or_default()),
    ];
    let mut message = String::with_capacity(template.len() + value.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        message.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders
            .iter()
            .find(|(placeholder, _)| tail.starts_with(*placeholder))
        {
            Some((placeholder, text)) => {
                message.push_str(text);
                rest = &tail[placeholder.len()..];
            }
            None => {
                message.push('{');
                rest = &tail[1..];
            }
        }
    }
    message.push_str(rest);
    message
}
