//! Typed validators, type-erased validators, and the adapter between them.
//!
//! A [`Validator<T>`] checks subjects of a type known at compile time. An
//! [`AnyValidator`] checks subjects of a type only known at runtime, which is what a
//! generic factory hands out. [`TypedAdapter<T>`] presents the latter as the former so
//! both kinds can run side by side in an [`AllOf<T>`].
//!
//! Rules are declared on struct fields with `#[derive(Validated)]` or registered through
//! [`ConfigurationRules`], grouped in named rule-sets, and assembled by a
//! [`ValidatorFactory`]. The [`binding`] layer drives them from text input.
extern crate self as easy_validation;

pub mod binding;
pub mod prelude;

mod errors;
mod factory;
mod results;
mod schema;
mod validators;

pub use binding::{Binding, BindingExpression, BoundField, FieldError, FieldRule};
pub use easy_validation_macros::Validated;
pub use errors::ValidationError;
pub use factory::{ConfigurationRules, SpecificationSource, ValidatorFactory};
pub use results::{ValidationResult, ValidationResults, format_message};
pub use schema::{
    AttributeRule, FieldValue, GetFn, ParseFn, PropertyDescriptor, PropertyShape, SetFn,
    SourceType, Validated, take_value,
};
pub use validators::adapter::TypedAdapter;
pub use validators::composite::{AllOf, AnyAllOf, PropertyValidator};
pub use validators::{
    AnyValidator, Erased, Validator, erase, one_of::OneOf, range::Range, range::RangeValue,
    string_length::StringLength, substring::Substring, valid_list::ValidList,
};

#[doc(hidden)]
pub mod __private {
    pub use once_cell;
}

/// Parses `raw` as a `T` and runs `validator` on it, the way a bound field would.
pub fn validate_text<T, V>(
    key: &str,
    raw: &str,
    validator: &V,
) -> Result<ValidationResults, ValidationError>
where
    T: FieldValue + 'static,
    V: Validator<T>,
{
    let value = T::parse(key, raw)?;
    let mut results = ValidationResults::new();
    validator.do_validate(&value, &value, key, &mut results)?;
    Ok(results)
}
