/// Errors raised by the validation machinery itself.
///
/// Rule violations are never reported through this type: they are data and end up in a
/// [`ValidationResults`](crate::ValidationResults) sink.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid validation setup: {0}")]
    Configuration(String),
    #[error("Failed to convert value for '{name}': {message}")]
    Conversion { name: String, message: String },
}

impl ValidationError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ValidationError::Configuration(message.into())
    }
}
