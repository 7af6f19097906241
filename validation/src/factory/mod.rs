use crate::ValidationError;
use crate::schema::{SourceType, Validated};
use crate::validators::composite::{AllOf, AnyAllOf, PropertyValidator};
use crate::validators::{AnyValidator, Validator, erase};
use indexmap::IndexMap;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Where a rule was declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpecificationSource {
    /// Attribute-declared rules first, then configured ones.
    #[default]
    All,
    Attributes,
    Configuration,
}

impl SpecificationSource {
    /// Whether rules declared in `origin` take part under this filter.
    pub fn includes(self, origin: SpecificationSource) -> bool {
        self == SpecificationSource::All || self == origin
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RuleKey {
    type_id: TypeId,
    ruleset: String,
}

impl RuleKey {
    fn new(type_id: TypeId, ruleset: &str) -> Self {
        Self {
            type_id,
            ruleset: ruleset.to_string(),
        }
    }
}

/// Rules registered explicitly at startup, as an external configuration would declare
/// them.
///
/// Registration is checked against the type's property table: an unknown property or a
/// validator for the wrong value type is rejected immediately.
#[derive(Clone, Default)]
pub struct ConfigurationRules {
    properties: IndexMap<RuleKey, Vec<(&'static str, Arc<dyn AnyValidator>)>>,
    objects: IndexMap<RuleKey, Vec<Arc<dyn AnyValidator>>>,
}

impl ConfigurationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `validator` for `property` of `T` in `ruleset` (empty for the default).
    pub fn property_rule<T, F, V>(
        mut self,
        property: &str,
        ruleset: &str,
        validator: V,
    ) -> Result<Self, ValidationError>
    where
        T: Validated,
        F: 'static,
        V: Validator<F> + 'static,
    {
        let descriptor = T::find_property(property).ok_or_else(|| {
            ValidationError::configuration(format!(
                "Property '{}' not found on type '{}'",
                property,
                T::type_label()
            ))
        })?;
        if descriptor.value_type_id() != TypeId::of::<F>() {
            return Err(ValidationError::configuration(format!(
                "Property '{}' of '{}' holds '{}', not '{}'",
                property,
                T::type_label(),
                descriptor.value_type(),
                type_name::<F>()
            )));
        }

        self.properties
            .entry(RuleKey::new(TypeId::of::<T>(), ruleset))
            .or_default()
            .push((descriptor.name(), erase::<F, V>(validator)));
        Ok(self)
    }

    /// Declares a validator for whole instances of `T`.
    pub fn object_rule<T: Validated, V: Validator<T> + 'static>(
        self,
        ruleset: &str,
        validator: V,
    ) -> Self {
        self.object_rule_any::<T>(ruleset, erase::<T, V>(validator))
    }

    /// Declares an already type-erased validator for whole instances of `T`.
    pub fn object_rule_any<T: Validated>(
        mut self,
        ruleset: &str,
        validator: Arc<dyn AnyValidator>,
    ) -> Self {
        self.objects
            .entry(RuleKey::new(TypeId::of::<T>(), ruleset))
            .or_default()
            .push(validator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.objects.is_empty()
    }

    fn property_validators<'a>(
        &'a self,
        type_id: TypeId,
        ruleset: &str,
        property: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn AnyValidator>> + 'a {
        self.properties
            .get(&RuleKey::new(type_id, ruleset))
            .into_iter()
            .flatten()
            .filter(move |(name, _)| *name == property)
            .map(|(_, validator)| validator)
    }

    fn object_validators(&self, type_id: TypeId, ruleset: &str) -> &[Arc<dyn AnyValidator>] {
        self.objects
            .get(&RuleKey::new(type_id, ruleset))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn declares(&self, type_id: TypeId, ruleset: &str) -> bool {
        let key = RuleKey::new(type_id, ruleset);
        self.properties.contains_key(&key) || self.objects.contains_key(&key)
    }
}

impl fmt::Debug for ConfigurationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationRules")
            .field("property_rule_sets", &self.properties.len())
            .field("object_rule_sets", &self.objects.len())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    type_id: TypeId,
    property: String,
    ruleset: String,
    source: SpecificationSource,
}

/// Builds and caches the validators for a type's properties.
///
/// The factory is the context object callers pass around: create it at startup with the
/// configured rules, share it (e.g. behind an `Arc`), and call [`reset`](Self::reset) to
/// drop every cached validator.
pub struct ValidatorFactory {
    configuration: ConfigurationRules,
    cache: RwLock<HashMap<CacheKey, Arc<AnyAllOf>>>,
}

impl ValidatorFactory {
    /// A factory that only knows attribute-declared rules.
    pub fn new() -> Self {
        Self::with_configuration(ConfigurationRules::default())
    }

    pub fn with_configuration(configuration: ConfigurationRules) -> Self {
        Self {
            configuration,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn configuration(&self) -> &ConfigurationRules {
        &self.configuration
    }

    /// The validators declared for `property` of `source` in `ruleset`, filtered by
    /// `filter`, as one composite.
    ///
    /// A named rule-set the type does not declare falls back to the default one.
    pub fn property_validator(
        &self,
        source: &SourceType,
        property: &str,
        ruleset: &str,
        filter: SpecificationSource,
    ) -> Result<Arc<AnyAllOf>, ValidationError> {
        if source.property(property).is_none() {
            return Err(ValidationError::configuration(format!(
                "Property '{}' not found on type '{}'",
                property,
                source.label()
            )));
        }

        let ruleset = self.resolve_ruleset(source, ruleset, filter);
        let key = CacheKey {
            type_id: source.type_id(),
            property: property.to_string(),
            ruleset: ruleset.to_string(),
            source: filter,
        };
        if let Some(cached) = self.read_cache().get(&key) {
            return Ok(Arc::clone(cached));
        }

        let built = Arc::new(self.build_property_validator(source, property, ruleset, filter));
        debug!(
            source = source.label(),
            property,
            ruleset,
            filter = ?filter,
            members = built.members().len(),
            "built property validator"
        );
        self.write_cache().insert(key, Arc::clone(&built));
        Ok(built)
    }

    /// Same as [`property_validator`](Self::property_validator), with every member
    /// presented as a `Validator<F>`.
    pub fn property_validator_for<T: Validated, F: 'static>(
        &self,
        property: &str,
        ruleset: &str,
        filter: SpecificationSource,
    ) -> Result<AllOf<F>, ValidationError> {
        let untyped = self.property_validator(&SourceType::of::<T>(), property, ruleset, filter)?;
        let mut typed = AllOf::new();
        for member in untyped.members() {
            typed.push_any(Arc::clone(member));
        }
        Ok(typed)
    }

    /// A validator for whole instances of `T`: every property with rules, in declaration
    /// order, then the configured object rules.
    pub fn object_validator<T: Validated>(
        &self,
        ruleset: &str,
        filter: SpecificationSource,
    ) -> Result<AllOf<T>, ValidationError> {
        let source = SourceType::of::<T>();
        let ruleset = self.resolve_ruleset(&source, ruleset, filter);

        let mut validator = AllOf::new();
        for property in T::properties() {
            let rules = self.property_validator(&source, property.name(), ruleset, filter)?;
            if !rules.is_empty() {
                validator.push(PropertyValidator::new(
                    property.name(),
                    property.getter(),
                    rules,
                ));
            }
        }
        if filter.includes(SpecificationSource::Configuration) {
            for rule in self.configuration.object_validators(source.type_id(), ruleset) {
                validator.push_any(Arc::clone(rule));
            }
        }
        Ok(validator)
    }

    /// Drops every cached validator.
    pub fn reset(&self) {
        let mut cache = self.write_cache();
        debug!(cached = cache.len(), "resetting validator factory");
        cache.clear();
    }

    pub fn cached_validators(&self) -> usize {
        self.read_cache().len()
    }

    fn resolve_ruleset<'a>(
        &self,
        source: &SourceType,
        ruleset: &'a str,
        filter: SpecificationSource,
    ) -> &'a str {
        if ruleset.is_empty() || self.declares(source, ruleset, filter) {
            return ruleset;
        }
        debug!(
            source = source.label(),
            ruleset, "rule-set not declared, using the default rule-set"
        );
        ""
    }

    fn declares(&self, source: &SourceType, ruleset: &str, filter: SpecificationSource) -> bool {
        (filter.includes(SpecificationSource::Attributes)
            && source
                .attribute_rules()
                .iter()
                .any(|rule| rule.ruleset() == ruleset))
            || (filter.includes(SpecificationSource::Configuration)
                && self.configuration.declares(source.type_id(), ruleset))
    }

    fn build_property_validator(
        &self,
        source: &SourceType,
        property: &str,
        ruleset: &str,
        filter: SpecificationSource,
    ) -> AnyAllOf {
        let mut members = Vec::new();
        if filter.includes(SpecificationSource::Attributes) {
            members.extend(
                source
                    .attribute_rules()
                    .iter()
                    .filter(|rule| rule.property() == property && rule.ruleset() == ruleset)
                    .map(|rule| Arc::clone(rule.validator())),
            );
        }
        if filter.includes(SpecificationSource::Configuration) {
            members.extend(
                self.configuration
                    .property_validators(source.type_id(), ruleset, property)
                    .cloned(),
            );
        }
        AnyAllOf::new(members)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Arc<AnyAllOf>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Arc<AnyAllOf>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ValidatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("configuration", &self.configuration)
            .field("cached_validators", &self.cached_validators())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use std::any::Any;
    use std::fmt::Display;

    #[derive(Debug, Default, Validated)]
    struct Customer {
        #[validate(validator = StringLength::at_least(2).with_message("name too short"))]
        #[validate(
            validator = StringLength::at_least(5).with_message("strict name too short"),
            ruleset = "strict"
        )]
        name: String,
        #[validate(validator = Range::between(18, 130).with_message("bad age"))]
        age: i32,
        nickname: String,
    }

    /// Rejects customers whose nickname equals their name.
    struct DistinctNickname;

    impl Validator<Customer> for DistinctNickname {
        fn do_validate(
            &self,
            subject: &Customer,
            _current_target: &dyn Any,
            key: &str,
            results: &mut ValidationResults,
        ) -> Result<(), ValidationError> {
            if subject.name == subject.nickname {
                results.log_failure(self, "nickname repeats name", &subject.name, key, None);
            }
            Ok(())
        }
    }

    impl Display for DistinctNickname {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "distinct nickname")
        }
    }

    fn customer(name: &str, age: i32, nickname: &str) -> Customer {
        Customer {
            name: name.to_string(),
            age,
            nickname: nickname.to_string(),
        }
    }

    fn name_messages(
        factory: &ValidatorFactory,
        value: &str,
        ruleset: &str,
        filter: SpecificationSource,
    ) -> Vec<String> {
        let validator = factory
            .property_validator(&SourceType::of::<Customer>(), "name", ruleset, filter)
            .unwrap();
        let mut results = ValidationResults::new();
        validator
            .do_validate_any(&value.to_string(), &(), "name", &mut results)
            .unwrap();
        results.messages().into_iter().map(String::from).collect()
    }

    fn configured_factory() -> ValidatorFactory {
        let configuration = ConfigurationRules::new()
            .property_rule::<Customer, String, _>(
                "name",
                "",
                Substring::new(" ").negated().with_message("name has spaces"),
            )
            .unwrap()
            .object_rule::<Customer, _>("", DistinctNickname);
        ValidatorFactory::with_configuration(configuration)
    }

    #[test]
    fn test_specification_source_includes() {
        use SpecificationSource::*;
        assert!(All.includes(Attributes));
        assert!(All.includes(Configuration));
        assert!(Attributes.includes(Attributes));
        assert!(!Attributes.includes(Configuration));
        assert!(!Configuration.includes(Attributes));
        assert_eq!(SpecificationSource::default(), All);
    }

    #[test]
    fn test_unknown_property_is_a_configuration_error() {
        let factory = ValidatorFactory::new();
        let result = factory.property_validator(
            &SourceType::of::<Customer>(),
            "missing",
            "",
            SpecificationSource::All,
        );
        assert!(matches!(
            result,
            Err(ValidationError::Configuration(message)) if message.contains("'missing'")
        ));
    }

    #[test]
    fn test_default_and_named_rulesets() {
        let factory = ValidatorFactory::new();

        assert_eq!(
            name_messages(&factory, "a", "", SpecificationSource::All),
            vec!["name too short"]
        );
        assert_eq!(
            name_messages(&factory, "abc", "strict", SpecificationSource::All),
            vec!["strict name too short"]
        );
        assert!(name_messages(&factory, "abc", "", SpecificationSource::All).is_empty());
    }

    #[test]
    fn test_undeclared_ruleset_falls_back_to_default() {
        let factory = ValidatorFactory::new();
        assert_eq!(
            name_messages(&factory, "a", "nope", SpecificationSource::All),
            vec!["name too short"]
        );
    }

    #[test]
    fn test_sources_are_filtered_and_ordered() {
        let factory = configured_factory();

        assert!(name_messages(&factory, "ab", "", SpecificationSource::All).is_empty());
        assert_eq!(
            name_messages(&factory, "a b", "", SpecificationSource::All),
            vec!["name has spaces"]
        );
        // Attribute-declared records come before configured ones.
        assert_eq!(
            name_messages(&factory, " ", "", SpecificationSource::All),
            vec!["name too short", "name has spaces"]
        );
        assert_eq!(
            name_messages(&factory, " ", "", SpecificationSource::Attributes),
            vec!["name too short"]
        );
        assert_eq!(
            name_messages(&factory, " ", "", SpecificationSource::Configuration),
            vec!["name has spaces"]
        );
    }

    #[test]
    fn test_object_validator() {
        let factory = configured_factory();
        let validator = factory
            .object_validator::<Customer>("", SpecificationSource::All)
            .unwrap();

        let results = validator.validate(&customer("x", 5, "x")).unwrap();

        assert_eq!(
            results.messages(),
            vec!["name too short", "bad age", "nickname repeats name"]
        );
        let keys: Vec<&str> = results.iter().map(|r| r.key().as_str()).collect();
        assert_eq!(keys, vec!["name", "age", ""]);

        assert!(validator
            .validate(&customer("Alice", 30, "Al"))
            .unwrap()
            .is_valid());
    }

    #[test]
    fn test_object_validator_with_attributes_only() {
        let factory = configured_factory();
        let validator = factory
            .object_validator::<Customer>("", SpecificationSource::Attributes)
            .unwrap();

        let results = validator.validate(&customer("x y", 40, "x y")).unwrap();

        assert!(results.is_valid());
        // nickname has no rules, so only name and age are present.
        assert_eq!(validator.len(), 2);
    }

    #[test]
    fn test_typed_property_validator() {
        let factory = ValidatorFactory::new();
        let validator = factory
            .property_validator_for::<Customer, i32>("age", "", SpecificationSource::All)
            .unwrap();

        assert_eq!(validator.len(), 1);
        assert_eq!(validator.validate(&12).unwrap().messages(), vec!["bad age"]);
        assert!(validator.validate(&40).unwrap().is_valid());
    }

    #[test]
    fn test_cache_and_reset() {
        let factory = ValidatorFactory::new();
        let source = SourceType::of::<Customer>();

        let first = factory
            .property_validator(&source, "name", "", SpecificationSource::All)
            .unwrap();
        let second = factory
            .property_validator(&source, "name", "", SpecificationSource::All)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_validators(), 1);

        factory.reset();
        assert_eq!(factory.cached_validators(), 0);

        let third = factory
            .property_validator(&source, "name", "", SpecificationSource::All)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_configuration_rejects_bad_registrations() {
        let unknown = ConfigurationRules::new().property_rule::<Customer, String, _>(
            "unknown",
            "",
            Substring::new("x"),
        );
        assert!(matches!(unknown, Err(ValidationError::Configuration(_))));

        let wrong_type = ConfigurationRules::new().property_rule::<Customer, String, _>(
            "age",
            "",
            Substring::new("x"),
        );
        assert!(matches!(
            wrong_type,
            Err(ValidationError::Configuration(message)) if message.contains("'age'")
        ));

        assert!(ConfigurationRules::new().is_empty());
    }

    #[test]
    fn test_configured_ruleset_is_declared() {
        let configuration = ConfigurationRules::new()
            .property_rule::<Customer, i32, _>(
                "age",
                "adults",
                Range::at_least(21).with_message("too young"),
            )
            .unwrap();
        let factory = ValidatorFactory::with_configuration(configuration);

        let validator = factory
            .object_validator::<Customer>("adults", SpecificationSource::All)
            .unwrap();
        let results = validator.validate(&customer("a", 19, "b")).unwrap();
        assert_eq!(results.messages(), vec!["too young"]);

        // The same rule-set is unknown when configuration is filtered out.
        let validator = factory
            .object_validator::<Customer>("adults", SpecificationSource::Attributes)
            .unwrap();
        let results = validator.validate(&customer("a", 19, "b")).unwrap();
        assert_eq!(results.messages(), vec!["name too short"]);
    }
}
