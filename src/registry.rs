use alloc::sync::Arc;
use core::any::TypeId;
use parking_lot::Mutex;
use tracing::{debug, debug_span, error};

use crate::{
    any::{Map, RcAny, TypeInfo},
    config::Config,
    errors::ResolveErrorKind,
    instantiator::{BoxCloneInstantiator, Instantiator},
};

/// Type-keyed store of registrations the [`crate::Registrar`] works on top of.
///
/// Every method is expected to be atomic on its own. Nothing makes a sequence of calls atomic.
pub trait Registry {
    #[must_use]
    fn is_registered<T: 'static>(&self) -> bool;

    /// Binds an already created instance
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AlreadyRegistered`] if the registry refuses to replace a slot
    fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> Result<(), ResolveErrorKind>;

    /// Binds a producer called on every fetch
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AlreadyRegistered`] if the registry refuses to replace a slot
    fn register_factory<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync;

    /// Binds a producer called on the first fetch, its value is cached for the next ones
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::AlreadyRegistered`] if the registry refuses to replace a slot
    fn register_lazy_singleton<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync;

    /// Fetches the current value of a slot, calling its producer if the slot needs it
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotRegistered`] if there is no slot for `T`
    /// - Returns [`ResolveErrorKind::AsyncRegistration`] if the slot can only be fetched asynchronously
    /// - Returns [`ResolveErrorKind::Instantiate`] if the producer fails
    ///
    /// Implementations may hold a lock while a lazy singleton's producer runs, see [`TypeRegistry`]
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind>;
}

macro_rules! impl_registry_for_handle {
    ($($handle:ty),*) => {
        $(
            impl<R: Registry> Registry for $handle {
                #[inline]
                fn is_registered<T: 'static>(&self) -> bool {
                    (**self).is_registered::<T>()
                }

                #[inline]
                fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> Result<(), ResolveErrorKind> {
                    (**self).register_instance(instance)
                }

                #[inline]
                fn register_factory<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
                where
                    Inst: Instantiator + Send + Sync,
                    Inst::Provides: Send + Sync,
                {
                    (**self).register_factory(instantiator)
                }

                #[inline]
                fn register_lazy_singleton<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
                where
                    Inst: Instantiator + Send + Sync,
                    Inst::Provides: Send + Sync,
                {
                    (**self).register_lazy_singleton(instantiator)
                }

                #[inline]
                fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
                    (**self).get::<T>()
                }
            }
        )*
    };
}

impl_registry_for_handle!(&R, Arc<R>);

#[derive(Clone)]
pub(crate) enum Slot {
    Instance(RcAny),
    Factory(BoxCloneInstantiator),
    LazySingleton {
        instantiator: BoxCloneInstantiator,
        cell: Arc<Mutex<Option<RcAny>>>,
    },
    #[cfg(feature = "async")]
    FactoryAsync(crate::async_impl::instantiator::BoxCloneInstantiator),
    #[cfg(feature = "async")]
    LazySingletonAsync {
        instantiator: crate::async_impl::instantiator::BoxCloneInstantiator,
        cell: Arc<tokio::sync::OnceCell<RcAny>>,
    },
}

impl Slot {
    #[inline]
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Slot::Instance(_) => "instance",
            Slot::Factory(_) => "factory",
            Slot::LazySingleton { .. } => "lazy_singleton",
            #[cfg(feature = "async")]
            Slot::FactoryAsync(_) => "factory_async",
            #[cfg(feature = "async")]
            Slot::LazySingletonAsync { .. } => "lazy_singleton_async",
        }
    }
}

/// In-memory [`Registry`].
///
/// Meant to be created once by the composition root and shared by reference or [`Arc`].
/// Tests create a fresh one per case.
///
/// # Warning
/// A lazy singleton's producer runs while its slot's cache lock is held, so concurrent first fetches
/// of that type block their threads until it returns. This includes `AsyncRegistry::get_async`,
/// which blocks the executor thread it runs on.
/// Producers registered with [`Registry::register_lazy_singleton`] should therefore be cheap,
/// and must not fetch their own type: the lock isn't reentrant and such a fetch never returns.
#[derive(Default)]
pub struct TypeRegistry {
    pub(crate) slots: Mutex<Map<Slot>>,
    pub(crate) config: Config,
}

impl TypeRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            slots: Mutex::new(Map::new()),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub(crate) fn insert(&self, type_info: TypeInfo, slot: Slot) -> Result<(), ResolveErrorKind> {
        let kind = slot.kind();
        let mut slots = self.slots.lock();

        if !self.config.allow_reassignment && slots.contains_key(&type_info) {
            let err = ResolveErrorKind::AlreadyRegistered { type_info };
            error!("{}", err);
            return Err(err);
        }

        match slots.insert(type_info, slot) {
            Some(previous) => debug!(kind, previous = previous.kind(), "Slot replaced"),
            None => debug!(kind, "Slot created"),
        }
        Ok(())
    }

    /// Clones a slot out of the map, so the map lock is released before any producer runs
    #[inline]
    pub(crate) fn slot(&self, type_info: &TypeInfo) -> Result<Slot, ResolveErrorKind> {
        match self.slots.lock().get(type_info) {
            Some(slot) => Ok(slot.clone()),
            None => {
                let err = ResolveErrorKind::NotRegistered { type_info: *type_info };
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Registry for TypeRegistry {
    #[inline]
    fn is_registered<T: 'static>(&self) -> bool {
        self.slots.lock().contains_key(&TypeInfo::of::<T>())
    }

    fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> Result<(), ResolveErrorKind> {
        self.insert(TypeInfo::of::<T>(), Slot::Instance(Arc::new(instance)))
    }

    fn register_factory<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.insert(
            TypeInfo::of::<Inst::Provides>(),
            Slot::Factory(BoxCloneInstantiator::new(instantiator)),
        )
    }

    fn register_lazy_singleton<Inst>(&self, instantiator: Inst) -> Result<(), ResolveErrorKind>
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        self.insert(
            TypeInfo::of::<Inst::Provides>(),
            Slot::LazySingleton {
                instantiator: BoxCloneInstantiator::new(instantiator),
                cell: Arc::new(Mutex::new(None)),
            },
        )
    }

    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let type_info = TypeInfo::of::<T>();
        let span = debug_span!("get", dependency = type_info.name);
        let _guard = span.enter();

        let slot = self.slot(&type_info)?;
        downcast(resolve_sync_slot(type_info, slot)?)
    }
}

/// Produces the value of a slot that doesn't need an executor.
///
/// Async slots are left to the async registry and reported as [`ResolveErrorKind::AsyncRegistration`] here.
pub(crate) fn resolve_sync_slot(type_info: TypeInfo, slot: Slot) -> Result<RcAny, ResolveErrorKind> {
    match slot {
        Slot::Instance(value) => {
            debug!("Found instance");
            Ok(value)
        }
        Slot::Factory(mut instantiator) => {
            let value = instantiator.call()?;
            debug!("Produced by factory");
            Ok(value)
        }
        Slot::LazySingleton { mut instantiator, cell } => {
            // Held across the producer, so it runs at most once at a time
            let mut guard = cell.lock();
            if let Some(value) = guard.as_ref() {
                debug!("Found in cache");
                return Ok(value.clone());
            }
            let value = instantiator.call()?;
            *guard = Some(value.clone());
            debug!("Cached");
            Ok(value)
        }
        #[cfg(feature = "async")]
        Slot::FactoryAsync(_) | Slot::LazySingletonAsync { .. } => {
            let err = ResolveErrorKind::AsyncRegistration { type_info };
            error!("{}", err);
            Err(err)
        }
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(value: RcAny) -> Result<Arc<T>, ResolveErrorKind> {
    value.downcast::<T>().map_err(|incorrect_type| {
        let err = ResolveErrorKind::IncorrectType {
            expected: TypeId::of::<T>(),
            actual: (*incorrect_type).type_id(),
        };
        error!("{}", err);
        err
    })
}
