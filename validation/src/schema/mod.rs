use crate::errors::ValidationError;
use crate::impl_field_value_for_fromstr;
use crate::validators::{AnyValidator, Validator, erase};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

pub(crate) mod macros;

/// The bridge between raw text coming from an input field and a strongly-typed
/// property value.
///
/// Input arrives as text. Before any declared rule can look at it, the text has to
/// become a value of the property's type. `FieldValue` is that conversion, plus the
/// reverse rendering used when a value has to be shown again.
///
/// The flow for a field update is:
/// **Raw text** -> **`FieldValue::parse`** -> **declared validators** -> **property**
///
/// A failed `parse` is a conversion error: declared validators never see such input.
pub trait FieldValue: Sized {
    /// Parses `value_str` into a value of the implementing type.
    ///
    /// `key` is the property name, carried into the error so that the failure can be
    /// attributed to a field.
    fn parse(key: &str, value_str: &str) -> Result<Self, ValidationError>;

    /// Renders the value back into its canonical text form.
    fn to_field_string(&self) -> String;
}

pub type ParseFn = fn(&str, &str) -> Result<Box<dyn Any + Send>, ValidationError>;
pub type GetFn<O> = fn(&O) -> &dyn Any;
pub type SetFn<O> = fn(&mut O, Box<dyn Any + Send>) -> Result<(), ValidationError>;

/// Type-erased metadata and accessors for one property of `O`.
///
/// `#[derive(Validated)]` builds one descriptor per named field. The accessors are
/// plain function pointers, so a descriptor table can live in a `static`.
pub struct PropertyDescriptor<O> {
    name: &'static str,
    value_type: &'static str,
    value_type_id: TypeId,
    parse: ParseFn,
    get: GetFn<O>,
    set: SetFn<O>,
}

impl<O> PropertyDescriptor<O> {
    pub fn new<F: 'static>(
        name: &'static str,
        get: GetFn<O>,
        parse: ParseFn,
        set: SetFn<O>,
    ) -> Self {
        Self {
            name,
            value_type: type_name::<F>(),
            value_type_id: TypeId::of::<F>(),
            parse,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    pub fn value_type_id(&self) -> TypeId {
        self.value_type_id
    }

    pub fn parse(&self, raw: &str) -> Result<Box<dyn Any + Send>, ValidationError> {
        (self.parse)(self.name, raw)
    }

    pub fn get<'a>(&self, owner: &'a O) -> &'a dyn Any {
        (self.get)(owner)
    }

    pub fn set(&self, owner: &mut O, value: Box<dyn Any + Send>) -> Result<(), ValidationError> {
        (self.set)(owner, value)
    }

    pub(crate) fn getter(&self) -> GetFn<O> {
        self.get
    }

    pub fn shape(&self) -> PropertyShape {
        PropertyShape {
            name: self.name,
            value_type: self.value_type,
            value_type_id: self.value_type_id,
            parse: self.parse,
        }
    }
}

impl<O> fmt::Debug for PropertyDescriptor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// The owner-independent part of a [`PropertyDescriptor`].
#[derive(Clone, Copy)]
pub struct PropertyShape {
    pub name: &'static str,
    pub value_type: &'static str,
    pub value_type_id: TypeId,
    parse: ParseFn,
}

impl PropertyShape {
    pub fn parse(&self, raw: &str) -> Result<Box<dyn Any + Send>, ValidationError> {
        (self.parse)(self.name, raw)
    }
}

impl fmt::Debug for PropertyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyShape")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// A validator declared on a property through `#[validate(...)]`.
///
/// The validator is stored type-erased: a type's rules for properties of different
/// value types live in one list.
#[derive(Clone)]
pub struct AttributeRule {
    property: &'static str,
    ruleset: &'static str,
    validator: Arc<dyn AnyValidator>,
}

impl AttributeRule {
    pub fn new<T: 'static, V: Validator<T> + 'static>(
        property: &'static str,
        ruleset: &'static str,
        validator: V,
    ) -> Self {
        Self {
            property,
            ruleset,
            validator: erase::<T, V>(validator),
        }
    }

    pub fn property(&self) -> &'static str {
        self.property
    }

    /// The rule-set the rule belongs to. Empty for the default rule-set.
    pub fn ruleset(&self) -> &'static str {
        self.ruleset
    }

    pub fn validator(&self) -> &Arc<dyn AnyValidator> {
        &self.validator
    }
}

impl fmt::Debug for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeRule")
            .field("property", &self.property)
            .field("ruleset", &self.ruleset)
            .field("validator", &self.validator.to_string())
            .finish()
    }
}

/// A type whose properties and declared rules are known without reflection.
///
/// Implemented by `#[derive(Validated)]`. Both tables are built once, on first use,
/// and cached in `static` cells for the rest of the process.
pub trait Validated: Sized + Send + Sync + 'static {
    fn type_label() -> &'static str;

    fn properties() -> &'static [PropertyDescriptor<Self>];

    fn attribute_rules() -> &'static [AttributeRule];

    fn find_property(name: &str) -> Option<&'static PropertyDescriptor<Self>> {
        Self::properties().iter().find(|p| p.name() == name)
    }
}

/// A runtime handle on a [`Validated`] type.
///
/// Used where the subject type is picked at runtime, e.g. by a field rule configured
/// after construction.
#[derive(Clone, Copy)]
pub struct SourceType {
    id: TypeId,
    label: &'static str,
    lookup: fn(&str) -> Option<PropertyShape>,
    attribute_rules: fn() -> &'static [AttributeRule],
}

fn lookup_shape<T: Validated>(name: &str) -> Option<PropertyShape> {
    T::find_property(name).map(PropertyDescriptor::shape)
}

impl SourceType {
    pub fn of<T: Validated>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            label: T::type_label(),
            lookup: lookup_shape::<T>,
            attribute_rules: T::attribute_rules,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn property(&self, name: &str) -> Option<PropertyShape> {
        (self.lookup)(name)
    }

    pub fn attribute_rules(&self) -> &'static [AttributeRule] {
        (self.attribute_rules)()
    }
}

impl PartialEq for SourceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SourceType {}

impl fmt::Debug for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceType").field(&self.label).finish()
    }
}

/// Unboxes a converted value for a property setter generated by `#[derive(Validated)]`.
#[doc(hidden)]
pub fn take_value<F: 'static>(
    property: &str,
    value: Box<dyn Any + Send>,
) -> Result<F, ValidationError> {
    value.downcast::<F>().map(|v| *v).map_err(|_| {
        ValidationError::configuration(format!(
            "Property '{}' expects a value of type '{}'",
            property,
            type_name::<F>()
        ))
    })
}

impl_field_value_for_fromstr!(
    bool, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

impl FieldValue for String {
    fn parse(_key: &str, s: &str) -> Result<Self, ValidationError> {
        Ok(s.to_string())
    }
    fn to_field_string(&self) -> String {
        self.clone()
    }
}

impl FieldValue for Vec<String> {
    fn parse(_key: &str, s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Vec::new());
        }
        Ok(s.split(',').map(|item| item.trim().to_string()).collect())
    }
    fn to_field_string(&self) -> String {
        self.join(",")
    }
}
