use alloc::sync::Arc;
use tracing::{debug, debug_span, error};

use crate::{
    any::TypeInfo,
    errors::ResolveErrorKind,
    instantiator::Instantiator,
    lifecycle::Lifecycle,
    registry::Registry,
};

/// Get-or-register layer over a [`Registry`].
///
/// The registry is passed in as a handle (`&TypeRegistry`, `Arc<TypeRegistry>` or an own implementation),
/// the registrar never creates a global one.
///
/// # Warning
/// The check, the registration and the fetch in [`Self::get_or_register`] are separate registry calls.
/// Two threads calling it for the same unregistered type may both register, the registry's
/// reassignment policy decides what happens to the second registration.
#[derive(Clone)]
pub struct Registrar<R> {
    pub(crate) registry: R,
    #[cfg(feature = "async")]
    pub(crate) locks: crate::lock::KeyedSharedLocks,
}

impl<R> Registrar<R> {
    #[inline]
    #[must_use]
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            #[cfg(feature = "async")]
            locks: crate::lock::KeyedSharedLocks::default(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> R {
        self.registry
    }
}

impl<R: Registry> Registrar<R> {
    #[inline]
    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registry.is_registered::<T>()
    }

    /// Returns the registered value of `Inst::Provides`, registering `instantiator` with `lifecycle` first
    /// if the type isn't registered yet.
    ///
    /// If the type is already registered, `instantiator` and `lifecycle` are ignored and the current
    /// value is returned, even when it was registered with another lifecycle.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnsupportedLifecycle`] if the type isn't registered and `lifecycle`
    ///   isn't one of [`Lifecycle::Singleton`], [`Lifecycle::Factory`] or [`Lifecycle::LazySingleton`].
    ///   Nothing is registered in that case.
    /// - Returns the factory's error as [`ResolveErrorKind::Instantiate`]
    /// - Returns the registry's errors as is
    pub fn get_or_register<Inst>(&self, instantiator: Inst, lifecycle: Lifecycle) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        let type_info = TypeInfo::of::<Inst::Provides>();
        let span = debug_span!("get_or_register", dependency = type_info.name, lifecycle = lifecycle.name());
        let _guard = span.enter();

        if self.registry.is_registered::<Inst::Provides>() {
            debug!("Already registered");
            return self.registry.get();
        }

        match lifecycle {
            Lifecycle::Singleton => {
                let mut instantiator = instantiator;
                let instance = instantiator.instantiate().map_err(|err| {
                    let err = ResolveErrorKind::Instantiate(err.into());
                    error!("{}", err);
                    err
                })?;
                self.registry.register_instance(instance)?;
                debug!("Registered as singleton");
            }
            Lifecycle::Factory => {
                self.registry.register_factory(instantiator)?;
                debug!("Registered as factory");
            }
            Lifecycle::LazySingleton => {
                self.registry.register_lazy_singleton(instantiator)?;
                debug!("Registered as lazy singleton");
            }
            lifecycle => return Err(unsupported(lifecycle, "get_or_register")),
        }

        self.registry.get()
    }

    /// [`Self::get_or_register`] with [`Lifecycle::Singleton`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn get_or_register_singleton<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register(instantiator, Lifecycle::Singleton)
    }

    /// [`Self::get_or_register`] with [`Lifecycle::Factory`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn get_or_register_factory<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register(instantiator, Lifecycle::Factory)
    }

    /// [`Self::get_or_register`] with [`Lifecycle::LazySingleton`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn get_or_register_lazy_singleton<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register(instantiator, Lifecycle::LazySingleton)
    }
}

pub(crate) fn unsupported(lifecycle: Lifecycle, operation: &'static str) -> ResolveErrorKind {
    let err = ResolveErrorKind::UnsupportedLifecycle { lifecycle, operation };
    error!("{}", err);
    err
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Registrar;
    use crate::{errors::InstantiateErrorKind, lifecycle::Lifecycle, registry::TypeRegistry, ResolveErrorKind};

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    #[derive(Debug)]
    struct Counter(u8);

    fn counting(call_count: &Arc<AtomicU8>) -> impl Fn() -> Result<Counter, InstantiateErrorKind> + Clone + Send + Sync {
        let call_count = call_count.clone();
        move || Ok(Counter(call_count.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    #[traced_test]
    fn test_unsupported_lifecycle() {
        let call_count = Arc::new(AtomicU8::new(0));
        let registrar = Registrar::new(TypeRegistry::new());

        let err = registrar.get_or_register(counting(&call_count), Lifecycle::Unsupported).unwrap_err();

        assert!(matches!(
            err,
            ResolveErrorKind::UnsupportedLifecycle {
                lifecycle: Lifecycle::Unsupported,
                operation: "get_or_register",
            }
        ));
        assert!(!registrar.is_registered::<Counter>());
        assert!(registrar.registry().is_empty());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
        assert!(logs_contain("isn't supported by `get_or_register`"));
    }

    #[test]
    #[traced_test]
    fn test_async_lifecycle_rejected() {
        let registrar = Registrar::new(TypeRegistry::new());

        for lifecycle in [Lifecycle::FactoryAsync, Lifecycle::LazySingletonAsync, Lifecycle::SingletonAsync] {
            assert!(matches!(
                registrar.get_or_register(|| Ok::<_, InstantiateErrorKind>(Counter(0)), lifecycle),
                Err(ResolveErrorKind::UnsupportedLifecycle { lifecycle: rejected, .. }) if rejected == lifecycle
            ));
        }
        assert!(!registrar.is_registered::<Counter>());
    }

    #[test]
    #[traced_test]
    fn test_unsupported_lifecycle_ignored_when_registered() {
        let registrar = Registrar::new(TypeRegistry::new());
        let first = registrar.get_or_register_singleton(|| Ok::<_, InstantiateErrorKind>(Counter(7))).unwrap();

        let second = registrar
            .get_or_register(|| Ok::<_, InstantiateErrorKind>(Counter(8)), Lifecycle::Unsupported)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(logs_contain("Already registered"));
    }

    #[test]
    #[traced_test]
    fn test_singleton_factory_error() {
        let registrar = Registrar::new(TypeRegistry::new());

        let err = registrar
            .get_or_register_singleton(|| Err::<Counter, _>(anyhow::anyhow!("connection refused")))
            .unwrap_err();

        assert!(matches!(err, ResolveErrorKind::Instantiate(_)));
        assert_eq!(format!("{err}"), "connection refused");
        assert!(!registrar.is_registered::<Counter>());
    }

    #[test]
    #[traced_test]
    fn test_registry_handle() {
        let registry = TypeRegistry::new();
        {
            let registrar = Registrar::new(&registry);
            registrar.get_or_register_singleton(|| Ok::<_, InstantiateErrorKind>(Counter(1))).unwrap();
        }
        let registrar = Registrar::new(&registry);
        assert!(registrar.is_registered::<Counter>());
        assert_eq!(registrar.get_or_register_factory(|| Ok::<_, InstantiateErrorKind>(Counter(2))).unwrap().0, 1);
    }
}
