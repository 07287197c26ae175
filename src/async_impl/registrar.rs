use alloc::sync::Arc;
use tracing::{debug, debug_span, error, Instrument as _};

use super::{instantiator::Instantiator, registry::AsyncRegistry};
use crate::{
    any::TypeInfo,
    errors::ResolveErrorKind,
    lifecycle::Lifecycle,
    registrar::{unsupported, Registrar},
};

impl<R: AsyncRegistry> Registrar<R> {
    /// Returns the value of `Inst::Provides`, registering `instantiator` with `lifecycle` first.
    ///
    /// - [`Lifecycle::FactoryAsync`]: `instantiator` is registered again on every call, replacing
    ///   the previous registration, and a fresh instance is awaited.
    /// - [`Lifecycle::LazySingletonAsync`]: `instantiator` is registered again on every call too,
    ///   so a later call drops the cached instance and may resolve to a new one.
    /// - [`Lifecycle::SingletonAsync`]: `instantiator` is awaited and its instance registered only if the type
    ///   isn't registered yet, otherwise the current value is returned.
    ///   Concurrent calls for the same type wait for each other, so `instantiator` runs once.
    ///   Calls for other types don't wait, so `instantiator` may resolve its own dependencies
    ///   through this registrar, but not `Inst::Provides` itself.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnsupportedLifecycle`] for any other `lifecycle`. Nothing is registered in that case.
    /// - Returns the factory's error as [`ResolveErrorKind::Instantiate`]
    /// - Returns the registry's errors as is
    pub async fn get_or_register_async<Inst>(&self, instantiator: Inst, lifecycle: Lifecycle) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        let type_info = TypeInfo::of::<Inst::Provides>();
        let span = debug_span!("get_or_register_async", dependency = type_info.name, lifecycle = lifecycle.name());

        async move {
            match lifecycle {
                Lifecycle::FactoryAsync => {
                    self.registry.register_factory_async(instantiator)?;
                    debug!("Registered as async factory");
                }
                Lifecycle::LazySingletonAsync => {
                    self.registry.register_lazy_singleton_async(instantiator)?;
                    debug!("Registered as async lazy singleton");
                }
                Lifecycle::SingletonAsync => {
                    let lock = self.locks.get(type_info);
                    let _guard = lock.lock().await;

                    if self.registry.is_registered::<Inst::Provides>() {
                        debug!("Already registered");
                    } else {
                        let mut instantiator = instantiator;
                        let instance = instantiator.instantiate().await.map_err(|err| {
                            let err = ResolveErrorKind::Instantiate(err.into());
                            error!("{}", err);
                            err
                        })?;
                        self.registry.register_instance(instance)?;
                        debug!("Registered as async singleton");
                    }
                }
                lifecycle => return Err(unsupported(lifecycle, "get_or_register_async")),
            }

            self.registry.get_async().await
        }
        .instrument(span)
        .await
    }

    /// [`Self::get_or_register_async`] with [`Lifecycle::FactoryAsync`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_or_register_factory_async<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register_async(instantiator, Lifecycle::FactoryAsync).await
    }

    /// [`Self::get_or_register_async`] with [`Lifecycle::LazySingletonAsync`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_or_register_lazy_singleton_async<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register_async(instantiator, Lifecycle::LazySingletonAsync).await
    }

    /// [`Self::get_or_register_async`] with [`Lifecycle::SingletonAsync`]
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_or_register_singleton_async<Inst>(&self, instantiator: Inst) -> Result<Arc<Inst::Provides>, ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.get_or_register_async(instantiator, Lifecycle::SingletonAsync).await
    }
}
