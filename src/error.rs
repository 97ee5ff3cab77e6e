use thiserror::Error;

/// Everything that can stop a generation request. Every variant is fatal: a request
/// either produces all of its output files or none of them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("couldn't resolve type {name} referenced from {referenced_from}")]
    UnresolvedReference {
        name: String,
        referenced_from: String,
    },

    #[error("{name} referenced from {referenced_from} can't be written there, {shadowed_by} shadows it")]
    ShadowedReference {
        name: String,
        referenced_from: String,
        shadowed_by: String,
    },

    #[error("{first} and {second} both map to {identifier} in {scope}")]
    NameCollision {
        scope: String,
        identifier: String,
        first: String,
        second: String,
    },

    #[error("unsupported field shape for {field}: {reason}")]
    UnsupportedFieldShape { field: String, reason: String },

    #[error("invalid option {option:?}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("couldn't decode descriptors: {0}")]
    Descriptor(String),

    #[error("{0} was requested but is not part of the descriptor set")]
    UnknownFile(String),
}

impl GenerateError {
    pub fn unsupported(field: &str, reason: impl Into<String>) -> Self {
        GenerateError::UnsupportedFieldShape {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn invalid_option(option: &str, reason: impl Into<String>) -> Self {
        GenerateError::InvalidOption {
            option: option.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
