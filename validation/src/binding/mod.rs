//! Field-level integration: text typed into an input field flows through conversion and
//! the declared rules before it reaches a property of the bound item.
//!
//! There is no UI here, only the contract a UI binding layer needs: one call per value
//! update, and at most one error per field afterwards.

use crate::factory::{SpecificationSource, ValidatorFactory};
use crate::schema::{PropertyDescriptor, SourceType, Validated};
use crate::validators::AnyValidator;
use crate::{ValidationError, ValidationResults};
use std::any::Any;
use std::fmt::{self, Display};
use std::sync::Arc;
use tracing::{debug, trace};

/// The error shown for a field after an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The text could not be turned into a value of the property type. No rule ran.
    Conversion { field: String, message: String },
    /// Declared rules rejected the value. `message` holds every failure message.
    Validation { field: String, message: String },
}

impl FieldError {
    pub fn field(&self) -> &str {
        match self {
            FieldError::Conversion { field, .. } | FieldError::Validation { field, .. } => field,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            FieldError::Conversion { message, .. } | FieldError::Validation { message, .. } => {
                message
            }
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content())
    }
}

/// What a live binding resolved to: the bound item's type and the property path.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingExpression {
    source_type: SourceType,
    path: String,
}

impl BindingExpression {
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Runs the validators declared for one property against a converted field value.
///
/// A rule is either created from a [`BindingExpression`], in which case source type and
/// property come from the expression and can no longer be changed, or created unbound
/// and configured explicitly. An unbound rule missing either piece fails when it is
/// first asked to validate.
#[derive(Clone, Debug, Default)]
pub struct FieldRule {
    source_type: Option<SourceType>,
    source_property: Option<String>,
    ruleset: String,
    specification_source: SpecificationSource,
    bound: bool,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_expression(expression: &BindingExpression) -> Self {
        Self {
            source_type: Some(expression.source_type),
            source_property: Some(expression.path.clone()),
            bound: true,
            ..Self::default()
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Result<Self, ValidationError> {
        self.ensure_unbound("source type")?;
        self.source_type = Some(source_type);
        Ok(self)
    }

    pub fn with_source_property(
        mut self,
        property: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        self.ensure_unbound("source property")?;
        let property = property.into();
        if property.is_empty() {
            return Err(ValidationError::configuration(
                "the source property name must not be empty",
            ));
        }
        self.source_property = Some(property);
        Ok(self)
    }

    /// Selects a named rule-set. Empty selects the default one.
    pub fn with_ruleset(mut self, ruleset: impl Into<String>) -> Self {
        self.ruleset = ruleset.into();
        self
    }

    pub fn with_specification_source(mut self, source: SpecificationSource) -> Self {
        self.specification_source = source;
        self
    }

    pub fn source_type(&self) -> Option<SourceType> {
        self.source_type
    }

    pub fn source_property(&self) -> Option<&str> {
        self.source_property.as_deref()
    }

    pub fn ruleset(&self) -> &str {
        &self.ruleset
    }

    pub fn specification_source(&self) -> SpecificationSource {
        self.specification_source
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Validates `value`, the converted field value, owned by `item`.
    pub fn validate(
        &self,
        factory: &ValidatorFactory,
        value: &dyn Any,
        item: &dyn Any,
    ) -> Result<ValidationResults, ValidationError> {
        let source_type = self.source_type.as_ref().ok_or_else(|| {
            ValidationError::configuration("the field rule has no source type")
        })?;
        let property = self.source_property.as_deref().ok_or_else(|| {
            ValidationError::configuration("the field rule has no source property")
        })?;

        let validator = factory.property_validator(
            source_type,
            property,
            &self.ruleset,
            self.specification_source,
        )?;
        let mut results = ValidationResults::new();
        validator.do_validate_any(value, item, property, &mut results)?;
        trace!(property, failures = results.len(), "field rule ran");
        Ok(results)
    }

    fn ensure_unbound(&self, what: &str) -> Result<(), ValidationError> {
        if self.bound {
            return Err(ValidationError::configuration(format!(
                "cannot set the {} of a rule created from a binding expression",
                what
            )));
        }
        Ok(())
    }
}

/// Describes how a field is bound to a property: the path and the rules to run.
#[derive(Clone, Debug)]
pub struct Binding {
    path: String,
    rules: Vec<FieldRule>,
}

impl Binding {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Attaches the binding to `item`. The path must name a property of `T`.
    pub fn bind<T: Validated>(
        self,
        item: T,
        factory: Arc<ValidatorFactory>,
    ) -> Result<BoundField<T>, ValidationError> {
        let property = T::find_property(&self.path).ok_or_else(|| {
            ValidationError::configuration(format!(
                "Binding path '{}' not found on type '{}'",
                self.path,
                T::type_label()
            ))
        })?;
        debug!(
            source = T::type_label(),
            path = %self.path,
            rules = self.rules.len(),
            "field bound"
        );
        Ok(BoundField {
            expression: BindingExpression {
                source_type: SourceType::of::<T>(),
                path: self.path,
            },
            item,
            property,
            rules: self.rules,
            factory,
            errors: Vec::new(),
        })
    }
}

/// A field bound to a property of a live item.
pub struct BoundField<T: Validated> {
    item: T,
    property: &'static PropertyDescriptor<T>,
    expression: BindingExpression,
    rules: Vec<FieldRule>,
    factory: Arc<ValidatorFactory>,
    errors: Vec<FieldError>,
}

impl<T: Validated> BoundField<T> {
    pub fn expression(&self) -> &BindingExpression {
        &self.expression
    }

    pub fn add_rule(&mut self, rule: FieldRule) {
        self.rules.push(rule);
    }

    /// Pushes new text into the field.
    ///
    /// Conversion failures and rule violations leave the item untouched and show up in
    /// [`errors`](Self::errors). Every rule runs, in order, and all failure messages are
    /// joined by newlines into a single field error. `Err` means the rules themselves are
    /// misconfigured.
    pub fn set_text(&mut self, text: &str) -> Result<(), ValidationError> {
        self.errors.clear();
        let field = self.property.name();

        let value = match self.property.parse(text) {
            Ok(value) => value,
            Err(ValidationError::Conversion { message, .. }) => {
                trace!(field, "conversion failed");
                self.errors.push(FieldError::Conversion {
                    field: field.to_string(),
                    message,
                });
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut failures = ValidationResults::new();
        for rule in &self.rules {
            failures.extend(rule.validate(&self.factory, &*value, &self.item)?);
        }
        if !failures.is_valid() {
            self.errors.push(FieldError::Validation {
                field: field.to_string(),
                message: failures.messages().join("\n"),
            });
            return Ok(());
        }

        self.property.set(&mut self.item, value)
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn into_item(self) -> T {
        self.item
    }
}
