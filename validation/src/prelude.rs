//! The `easy_validation` prelude.

pub use crate::binding::{Binding, BindingExpression, BoundField, FieldError, FieldRule};
pub use crate::errors::ValidationError;
pub use crate::factory::{ConfigurationRules, SpecificationSource, ValidatorFactory};
pub use crate::results::{ValidationResult, ValidationResults};
pub use crate::schema::{FieldValue, SourceType, Validated};
pub use crate::validators::{
    AnyValidator, Validator, adapter::TypedAdapter, composite::AllOf, composite::AnyAllOf,
    composite::PropertyValidator, erase, one_of::OneOf, range::Range,
    string_length::StringLength, substring::Substring, valid_list::ValidList,
};
pub use easy_validation_macros::Validated;
