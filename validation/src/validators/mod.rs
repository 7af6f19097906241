use crate::{ValidationError, ValidationResults};
use std::any::{Any, type_name};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

pub(crate) mod adapter;
pub(crate) mod composite;
pub(crate) mod one_of;
pub(crate) mod range;
pub(crate) mod string_length;
pub(crate) mod substring;
pub(crate) mod valid_list;

/// A validator for subjects of a type known at compile time.
///
/// Failures are data: they are appended to `results` and `do_validate` still returns
/// `Ok`. An `Err` means the validator could not run at all.
pub trait Validator<T: 'static>: Display + Send + Sync {
    /// Checks `subject` and appends zero or more records to `results`.
    ///
    /// `current_target` is the object owning `subject` (or `subject` itself for
    /// top-level calls) and `key` labels the records, usually with a property name.
    fn do_validate(
        &self,
        subject: &T,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError>;

    /// The template set explicitly on this instance, if any.
    fn message_template(&self) -> Option<&str> {
        None
    }

    /// The template used when none was set explicitly.
    fn default_message_template(&self) -> Option<String> {
        None
    }

    fn tag(&self) -> Option<&str> {
        None
    }

    /// Runs the validator on a top-level subject with a fresh sink.
    fn validate(&self, subject: &T) -> Result<ValidationResults, ValidationError> {
        let mut results = ValidationResults::new();
        self.do_validate(subject, subject, "", &mut results)?;
        Ok(results)
    }
}

/// A validator for a subject whose type is only known at runtime.
pub trait AnyValidator: Display + Send + Sync {
    fn do_validate_any(
        &self,
        subject: &dyn Any,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError>;

    /// Name of the subject type the validator was written for.
    fn subject_type_name(&self) -> &'static str;
}

/// Hides the subject type of a typed validator.
///
/// A subject of any other runtime type is reported as a failure record rather than
/// an error, the same way a rule violation would be.
pub struct Erased<T, V> {
    inner: V,
    _subject: PhantomData<fn(&T)>,
}

impl<T: 'static, V: Validator<T>> AnyValidator for Erased<T, V> {
    fn do_validate_any(
        &self,
        subject: &dyn Any,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        match subject.downcast_ref::<T>() {
            Some(subject) => self.inner.do_validate(subject, current_target, key, results),
            None => {
                trace!(key, expected = type_name::<T>(), "subject type mismatch");
                results.log_failure(
                    &self.inner,
                    &format!("Value of type '{}' expected for {{key}}", type_name::<T>()),
                    &"<unknown>",
                    key,
                    self.inner.tag(),
                );
                Ok(())
            }
        }
    }

    fn subject_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl<T, V: Display> Display for Erased<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Boxes `validator` behind the untyped interface.
pub fn erase<T: 'static, V: Validator<T> + 'static>(validator: V) -> Arc<dyn AnyValidator> {
    Arc::new(Erased {
        inner: validator,
        _subject: PhantomData::<fn(&T)>,
    })
}

/// Message, tag and negation shared by the value validators.
#[derive(Clone, Debug, Default)]
pub(crate) struct Settings {
    pub(crate) message: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) negated: bool,
}

impl Settings {
    /// Logs a failure using the explicit template or `default`.
    pub(crate) fn log(
        &self,
        validator: &dyn Display,
        default: &str,
        value: &dyn Display,
        key: &str,
        results: &mut ValidationResults,
    ) {
        let template = self.message.as_deref().unwrap_or(default);
        results.log_failure(validator, template, value, key, self.tag.as_deref());
    }
}
