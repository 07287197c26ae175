use alloc::sync::Arc;
use core::future::Future;
use tracing::{debug, debug_span, Instrument as _};

use super::instantiator::{BoxCloneInstantiator, Instantiator};
use crate::{
    any::TypeInfo,
    errors::ResolveErrorKind,
    registry::{downcast, resolve_sync_slot, Registry, Slot, TypeRegistry},
};

/// Async registrations on top of a [`Registry`]
pub trait AsyncRegistry: Registry {
    /// Binds an async producer called on every fetch
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AlreadyRegistered`] if the registry refuses to replace a slot
    fn register_factory_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync;

    /// Binds an async producer awaited on the first fetch, its value is cached for the next ones
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AlreadyRegistered`] if the registry refuses to replace a slot
    fn register_lazy_singleton_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync;

    /// Fetches the current value of a slot of any kind
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotRegistered`] if there is no slot for `T`
    /// - Returns [`ResolveErrorKind::Instantiate`] if the producer fails
    fn get_async<T: Send + Sync + 'static>(&self) -> impl Future<Output = Result<Arc<T>, ResolveErrorKind>> + Send;
}

macro_rules! impl_async_registry_for_handle {
    ($($handle:ty),*) => {
        $(
            impl<R: AsyncRegistry> AsyncRegistry for $handle {
                #[inline]
                fn register_factory_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
                where
                    Inst: Instantiator + Send + Sync,
                    Inst::Provides: Send + Sync,
                {
                    (**self).register_factory_async(instantiator)
                }

                #[inline]
                fn register_lazy_singleton_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
                where
                    Inst: Instantiator + Send + Sync,
                    Inst::Provides: Send + Sync,
                {
                    (**self).register_lazy_singleton_async(instantiator)
                }

                #[inline]
                fn get_async<T: Send + Sync + 'static>(&self) -> impl Future<Output = Result<Arc<T>, ResolveErrorKind>> + Send {
                    (**self).get_async::<T>()
                }
            }
        )*
    };
}

impl_async_registry_for_handle!(&R, Arc<R>);

impl AsyncRegistry for TypeRegistry {
    fn register_factory_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.insert(
            TypeInfo::of::<Inst::Provides>(),
            Slot::FactoryAsync(BoxCloneInstantiator::new(instantiator)),
        )
    }

    fn register_lazy_singleton_async<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.insert(
            TypeInfo::of::<Inst::Provides>(),
            Slot::LazySingletonAsync {
                instantiator: BoxCloneInstantiator::new(instantiator),
                cell: Arc::new(tokio::sync::OnceCell::new()),
            },
        )
    }

    fn get_async<T: Send + Sync + 'static>(&self) -> impl Future<Output = Result<Arc<T>, ResolveErrorKind>> + Send {
        let type_info = TypeInfo::of::<T>();
        let span = debug_span!("get_async", dependency = type_info.name);

        let slot = {
            let _guard = span.enter();
            self.slot(&type_info)
        };
        async move {
            let value = match slot? {
                Slot::FactoryAsync(instantiator) => {
                    let value = instantiator.call().await?;
                    debug!("Produced by async factory");
                    value
                }
                Slot::LazySingletonAsync { instantiator, cell } => {
                    if let Some(value) = cell.get() {
                        debug!("Found in cache");
                        value.clone()
                    } else {
                        let value = cell.get_or_try_init(|| instantiator.call()).await?.clone();
                        debug!("Cached");
                        value
                    }
                }
                slot => resolve_sync_slot(type_info, slot)?,
            };
            downcast(value)
        }
        .instrument(span)
    }
}
