use core::any::TypeId;

use super::InstantiateErrorKind;
use crate::{any::TypeInfo, lifecycle::Lifecycle};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Lifecycle `{lifecycle}` isn't supported by `{operation}`")]
    UnsupportedLifecycle {
        lifecycle: Lifecycle,
        operation: &'static str,
    },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
    #[error("`{type_info}` isn't registered")]
    NotRegistered { type_info: TypeInfo },
    #[error("`{type_info}` is already registered and reassignment is disabled")]
    AlreadyRegistered { type_info: TypeInfo },
    #[error("`{type_info}` is registered with an async factory, use an async fetch")]
    AsyncRegistration { type_info: TypeInfo },
    #[error("Incorrect registered type. Actual: {actual:?}, expected: {expected:?}")]
    IncorrectType { expected: TypeId, actual: TypeId },
}
