use crate::validators::{AnyValidator, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::sync::Arc;

/// Presents an untyped validator as a `Validator<T>`.
///
/// Validators produced generically (by the factory, from configuration, ...) only come
/// as `Arc<dyn AnyValidator>`. Wrapping them lets them sit next to hand-written typed
/// validators in an [`AllOf<T>`](crate::AllOf).
///
/// The adapter only forwards. It does not check the subject type, has no message of
/// its own, and passes the wrapped validator's records and errors through untouched.
pub struct TypedAdapter<T> {
    wrapped: Arc<dyn AnyValidator>,
    _subject: PhantomData<fn(&T)>,
}

impl<T> TypedAdapter<T> {
    pub fn new(wrapped: Arc<dyn AnyValidator>) -> Self {
        Self {
            wrapped,
            _subject: PhantomData,
        }
    }

    pub fn wrapped(&self) -> &Arc<dyn AnyValidator> {
        &self.wrapped
    }
}

impl<T> TryFrom<Option<Arc<dyn AnyValidator>>> for TypedAdapter<T> {
    type Error = ValidationError;

    fn try_from(wrapped: Option<Arc<dyn AnyValidator>>) -> Result<Self, Self::Error> {
        wrapped.map(Self::new).ok_or_else(|| {
            ValidationError::configuration("a typed adapter needs a validator to wrap")
        })
    }
}

impl<T> Clone for TypedAdapter<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.wrapped))
    }
}

impl<T: 'static> Validator<T> for TypedAdapter<T> {
    fn do_validate(
        &self,
        subject: &T,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        self.wrapped
            .do_validate_any(subject, current_target, key, results)
    }
}

impl<T> Display for TypedAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.wrapped.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    impl AnyValidator for Failing {
        fn do_validate_any(
            &self,
            _subject: &dyn Any,
            _current_target: &dyn Any,
            _key: &str,
            _results: &mut ValidationResults,
        ) -> Result<(), ValidationError> {
            Err(ValidationError::Configuration("broken".to_string()))
        }

        fn subject_type_name(&self) -> &'static str {
            "anything"
        }
    }

    impl Display for Failing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failing")
        }
    }

    /// Records every call it receives.
    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
    }

    impl AnyValidator for Recording {
        fn do_validate_any(
            &self,
            subject: &dyn Any,
            current_target: &dyn Any,
            key: &str,
            results: &mut ValidationResults,
        ) -> Result<(), ValidationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let subject = subject.downcast_ref::<i32>().copied().unwrap_or(-1);
            let target = current_target.downcast_ref::<&str>().copied().unwrap_or("?");
            results.push(ValidationResult::new(
                subject.to_string(),
                key,
                target,
                None,
                "recording",
            ));
            Ok(())
        }

        fn subject_type_name(&self) -> &'static str {
            "i32"
        }
    }

    impl Display for Recording {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "recording")
        }
    }

    #[test]
    fn test_adapter_produces_same_records_as_wrapped() {
        let wrapped =
            erase::<String, _>(Substring::new("b").negated().with_message("invalid string"));
        let adapter = TypedAdapter::<String>::new(wrapped.clone());

        for input in ["bbbb", "aaaa", "abc", ""] {
            let subject = input.to_string();
            let mut direct = ValidationResults::new();
            wrapped
                .do_validate_any(&subject, &"owner", "field", &mut direct)
                .unwrap();

            let mut adapted = ValidationResults::new();
            adapter
                .do_validate(&subject, &"owner", "field", &mut adapted)
                .unwrap();

            assert_eq!(direct, adapted, "records differ for input '{}'", input);
        }
    }

    #[test]
    fn test_adapter_forwards_arguments_unchanged() {
        let recording = Arc::new(Recording::default());
        let adapter = TypedAdapter::<i32>::new(recording.clone());
        let mut results = ValidationResults::new();

        adapter.do_validate(&7, &"owner", "the.key", &mut results).unwrap();

        assert_eq!(recording.calls.load(Ordering::SeqCst), 1);
        let record = results.iter().next().unwrap();
        assert_eq!(record.target(), "7");
        assert_eq!(record.key(), "the.key");
        assert_eq!(record.message(), "owner");
    }

    #[test]
    fn test_adapter_appends_to_existing_records() {
        let adapter = TypedAdapter::<i32>::new(Arc::new(Recording::default()));
        let mut results = ValidationResults::new();
        results.push(ValidationResult::new("x", "k", "earlier", None, "other"));

        adapter.do_validate(&1, &"t", "k", &mut results).unwrap();

        assert_eq!(results.messages(), vec!["earlier", "t"]);
    }

    #[test]
    fn test_adapter_without_validator_is_rejected() {
        let result = TypedAdapter::<String>::try_from(None::<Arc<dyn AnyValidator>>);
        assert!(matches!(result, Err(ValidationError::Configuration(_))));

        let result = TypedAdapter::<i32>::try_from(None::<Arc<dyn AnyValidator>>);
        assert!(matches!(result, Err(ValidationError::Configuration(_))));
    }

    #[test]
    fn test_adapter_has_no_message_of_its_own() {
        let wrapped = erase::<i32, _>(Range::between(0, 1).with_message("custom"));
        let adapter = TypedAdapter::<i32>::try_from(Some(wrapped)).unwrap();

        assert_eq!(adapter.default_message_template(), None);
        assert_eq!(adapter.message_template(), None);
        assert_eq!(adapter.tag(), None);
    }

    #[test]
    fn test_adapter_propagates_errors() {
        let adapter = TypedAdapter::<String>::new(Arc::new(Failing));
        let mut results = ValidationResults::new();

        let outcome = adapter.do_validate(&"x".to_string(), &(), "k", &mut results);

        assert_eq!(outcome, Err(ValidationError::Configuration("broken".to_string())));
        assert!(results.is_empty());
    }

    #[test]
    fn test_adapter_does_not_check_subject_type() {
        // A String validator behind an i32 adapter: the wrapped validator decides.
        let adapter = TypedAdapter::<i32>::new(erase::<String, _>(Substring::new("a")));
        let results = adapter.validate(&3).unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.messages()[0].contains("String"));
    }

    #[test]
    fn test_adapter_is_idempotent() {
        let adapter = TypedAdapter::<i32>::new(erase::<i32, _>(Range::between(10, 20)));

        let first = adapter.validate(&1).unwrap();
        let second = adapter.validate(&1).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_wrapped_accessor_and_display() {
        let wrapped = erase::<i32, _>(Range::at_least(3));
        let adapter = TypedAdapter::<i32>::new(wrapped.clone());

        assert!(Arc::ptr_eq(adapter.wrapped(), &wrapped));
        assert_eq!(adapter.to_string(), wrapped.to_string());
        assert!(Arc::ptr_eq(adapter.clone().wrapped(), &wrapped));
    }
}
