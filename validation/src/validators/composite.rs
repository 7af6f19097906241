use crate::schema::GetFn;
use crate::validators::adapter::TypedAdapter;
use crate::validators::{AnyValidator, Validator};
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Runs every member in order against the same subject.
///
/// Members append to the shared sink; the first error aborts the run.
pub struct AllOf<T: 'static> {
    members: Vec<Arc<dyn Validator<T>>>,
}

impl<T: 'static> AllOf<T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn push<V: Validator<T> + 'static>(&mut self, validator: V) {
        self.members.push(Arc::new(validator));
    }

    /// Adds an untyped validator through a [`TypedAdapter`].
    pub fn push_any(&mut self, validator: Arc<dyn AnyValidator>) {
        self.push(TypedAdapter::<T>::new(validator));
    }

    pub fn with<V: Validator<T> + 'static>(mut self, validator: V) -> Self {
        self.push(validator);
        self
    }

    pub fn members(&self) -> &[Arc<dyn Validator<T>>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: 'static> Default for AllOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for AllOf<T> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<T: 'static> Validator<T> for AllOf<T> {
    fn do_validate(
        &self,
        subject: &T,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        for member in &self.members {
            member.do_validate(subject, current_target, key, results)?;
        }
        Ok(())
    }
}

impl<T: 'static> Display for AllOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members.iter().map(|m| m.to_string()).collect();
        write!(f, "all of [{}]", members.join(", "))
    }
}

/// The untyped counterpart of [`AllOf`].
#[derive(Clone, Default)]
pub struct AnyAllOf {
    members: Vec<Arc<dyn AnyValidator>>,
}

impl AnyAllOf {
    pub fn new(members: Vec<Arc<dyn AnyValidator>>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Arc<dyn AnyValidator>] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl AnyValidator for AnyAllOf {
    fn do_validate_any(
        &self,
        subject: &dyn Any,
        current_target: &dyn Any,
        key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        for member in &self.members {
            member.do_validate_any(subject, current_target, key, results)?;
        }
        Ok(())
    }

    fn subject_type_name(&self) -> &'static str {
        self.members
            .first()
            .map_or("dyn Any", |m| m.subject_type_name())
    }
}

impl Display for AnyAllOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members.iter().map(|m| m.to_string()).collect();
        write!(f, "all of [{}]", members.join(", "))
    }
}

/// Validates one property of an owner `O`.
///
/// The property value becomes the subject, the owner becomes the current target and the
/// property name becomes the key.
pub struct PropertyValidator<O> {
    property: &'static str,
    get: GetFn<O>,
    validator: Arc<dyn AnyValidator>,
}

impl<O> PropertyValidator<O> {
    pub fn new(property: &'static str, get: GetFn<O>, validator: Arc<dyn AnyValidator>) -> Self {
        Self {
            property,
            get,
            validator,
        }
    }

    pub fn property(&self) -> &'static str {
        self.property
    }

    pub fn validator(&self) -> &Arc<dyn AnyValidator> {
        &self.validator
    }
}

impl<O: 'static> Validator<O> for PropertyValidator<O> {
    fn do_validate(
        &self,
        subject: &O,
        _current_target: &dyn Any,
        _key: &str,
        results: &mut ValidationResults,
    ) -> Result<(), ValidationError> {
        self.validator
            .do_validate_any((self.get)(subject), subject, self.property, results)
    }
}

impl<O> Display for PropertyValidator<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    struct Account {
        name: String,
    }

    fn account_name(account: &Account) -> &dyn Any {
        &account.name
    }

    #[test]
    fn test_all_of_runs_members_in_order() {
        let all = AllOf::<String>::new()
            .with(Substring::new("@").with_message("first"))
            .with(StringLength::at_least(10).with_message("second"));

        let results = all.validate(&"short".to_string()).unwrap();

        assert_eq!(results.messages(), vec!["first", "second"]);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_all_of_mixes_typed_and_untyped_members() {
        let mut all = AllOf::<i32>::new();
        all.push(Range::at_least(0).with_message("typed"));
        all.push_any(erase::<i32, _>(Range::at_most(-5).with_message("untyped")));

        let results = all.validate(&1).unwrap();

        assert_eq!(results.messages(), vec!["untyped"]);
        assert_eq!(all.to_string(), "all of [[0, ...], [..., -5]]");
    }

    #[test]
    fn test_empty_all_of_accepts_everything() {
        let all = AllOf::<String>::default();
        assert!(all.is_empty());
        assert!(all.validate(&"anything".to_string()).unwrap().is_valid());
    }

    #[test]
    fn test_any_all_of() {
        let all = AnyAllOf::new(vec![
            erase::<String, _>(Substring::new("x")),
            erase::<String, _>(StringLength::at_most(2)),
        ]);
        let mut results = ValidationResults::new();

        all.do_validate_any(&"abc".to_string(), &(), "k", &mut results)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(all.subject_type_name(), std::any::type_name::<String>());
        assert_eq!(AnyAllOf::default().subject_type_name(), "dyn Any");
    }

    #[test]
    fn test_property_validator_uses_property_as_key() {
        let validator = PropertyValidator::<Account>::new(
            "name",
            account_name,
            erase::<String, _>(StringLength::at_least(3).with_message("{key} too short")),
        );
        let account = Account {
            name: "ab".to_string(),
        };

        let results = validator.validate(&account).unwrap();

        let record = results.iter().next().unwrap();
        assert_eq!(record.key(), "name");
        assert_eq!(record.message(), "name too short");
        assert_eq!(record.target(), "ab");
        assert_eq!(validator.property(), "name");
    }
}
