use thiserror::Error;

/// Errors raised while building a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("type name {0:?} is already registered")]
    DuplicateName(String),

    #[error("type {type_url} is already registered as {existing:?}")]
    DuplicateType { type_url: String, existing: String },
}
