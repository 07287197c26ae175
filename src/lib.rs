//! Get-or-register helpers over a type-keyed registry.
//!
//! A [`Registrar`] takes a factory and a [`Lifecycle`] and either returns the value already registered
//! for the factory's type, or registers the factory according to the lifecycle and returns the new value.
//!
//! ```
//! use registrar::{InstantiateErrorKind, Lifecycle, Registrar, TypeRegistry};
//! use std::sync::Arc;
//!
//! struct Config {
//!     name: &'static str,
//! }
//!
//! let registrar = Registrar::new(TypeRegistry::new());
//!
//! let config = registrar
//!     .get_or_register(|| Ok::<_, InstantiateErrorKind>(Config { name: "test" }), Lifecycle::Singleton)
//!     .unwrap();
//! // Already registered, so the factory and the lifecycle are ignored
//! let same = registrar
//!     .get_or_register(|| Ok::<_, InstantiateErrorKind>(Config { name: "other" }), Lifecycle::Factory)
//!     .unwrap();
//!
//! assert!(Arc::ptr_eq(&config, &same));
//! assert_eq!(same.name, "test");
//! ```
#![no_std]

extern crate alloc;

pub(crate) mod any;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod instantiator;
pub(crate) mod lifecycle;
pub(crate) mod registrar;
pub(crate) mod registry;
pub(crate) mod utils;

#[cfg(feature = "async")]
pub(crate) mod lock;

#[cfg(feature = "async")]
pub mod async_impl;

pub use any::TypeInfo;
pub use config::Config;
pub use errors::{InstantiateErrorKind, ResolveErrorKind};
pub use instantiator::Instantiator;
pub use lifecycle::Lifecycle;
pub use registrar::Registrar;
pub use registry::{Registry, TypeRegistry};

#[cfg(feature = "async")]
pub use async_impl::AsyncRegistry;
