#[macro_export]
/// Macro to reduce boilerplate for field types implementing FromStr.
macro_rules! impl_field_value_for_fromstr {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                fn parse(key: &str, s: &str) -> Result<Self, ValidationError> {
                    s.trim()
                    .to_lowercase()
                    .parse()
                    .map_err(|e| ValidationError::Conversion {
                        name: key.to_string(),
                        message: format!("{}", e),
                    })
                }
                fn to_field_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

/// Builder methods shared by validators carrying a `settings: Settings` field.
macro_rules! impl_validator_settings {
    ($t:ty, negatable) => {
        $crate::schema::macros::impl_validator_settings!($t);

        impl $t {
            /// Inverts the check: values passing the original rule now fail.
            pub fn negated(mut self) -> Self {
                self.settings.negated = !self.settings.negated;
                self
            }
        }
    };
    ($t:ty) => {
        impl $t {
            /// Replaces the default message. `{value}`, `{key}` and `{tag}` are substituted.
            pub fn with_message(mut self, template: impl Into<String>) -> Self {
                self.settings.message = Some(template.into());
                self
            }

            pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
                self.settings.tag = Some(tag.into());
                self
            }
        }
    };
}

pub(crate) use impl_validator_settings;
