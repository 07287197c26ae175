use alloc::{boxed::Box, sync::Arc};
use tracing::error;

use crate::{any::RcAny, errors::InstantiateErrorKind};

/// Zero-argument producer of an instance.
///
/// Implemented for every `FnMut() -> Result<T, E>` closure that is [`Clone`],
/// where `E` converts into [`InstantiateErrorKind`].
pub trait Instantiator: Clone + 'static {
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self) -> Result<Self::Provides, Self::Error>;
}

impl<F, Response, Err> Instantiator for F
where
    F: FnMut() -> Result<Response, Err> + Clone + 'static,
    Response: 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&mut self) -> Result<Self::Provides, Self::Error> {
        self()
    }
}

pub(crate) trait CloneInstantiator {
    fn call(&mut self) -> Result<RcAny, InstantiateErrorKind>;

    #[must_use]
    fn clone_box(&self) -> Box<dyn CloneInstantiator + Send + Sync>;
}

#[derive(Clone)]
struct Erased<Inst>(Inst);

impl<Inst> CloneInstantiator for Erased<Inst>
where
    Inst: Instantiator + Send + Sync,
    Inst::Provides: Send + Sync,
{
    fn call(&mut self) -> Result<RcAny, InstantiateErrorKind> {
        match self.0.instantiate() {
            Ok(instance) => Ok(Arc::new(instance) as _),
            Err(err) => {
                let err = err.into();
                error!("{}", err);
                Err(err)
            }
        }
    }

    #[inline]
    fn clone_box(&self) -> Box<dyn CloneInstantiator + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Type-erased instantiator stored in a registry slot.
///
/// Cloned out of the slot before it's called, so no registry lock is held while the factory runs.
pub(crate) struct BoxCloneInstantiator(Box<dyn CloneInstantiator + Send + Sync>);

impl BoxCloneInstantiator {
    #[inline]
    #[must_use]
    pub(crate) fn new<Inst>(instantiator: Inst) -> Self
    where
        Inst: Instantiator + Send + Sync,
        Inst::Provides: Send + Sync,
    {
        Self(Box::new(Erased(instantiator)))
    }

    #[inline]
    pub(crate) fn call(&mut self) -> Result<RcAny, InstantiateErrorKind> {
        self.0.call()
    }
}

impl Clone for BoxCloneInstantiator {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{BoxCloneInstantiator, Instantiator as _};
    use crate::errors::InstantiateErrorKind;

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_closure_instantiator() {
        let mut instantiator = || Ok::<_, InstantiateErrorKind>(42u8);
        assert_eq!(instantiator.instantiate().unwrap(), 42);
    }

    #[test]
    #[traced_test]
    fn test_boxed_calls_every_time() {
        let call_count = Arc::new(AtomicU8::new(0));
        let mut instantiator = BoxCloneInstantiator::new({
            let call_count = call_count.clone();
            move || {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, InstantiateErrorKind>(1u16)
            }
        });

        let first = instantiator.call().unwrap();
        let second = instantiator.clone().call().unwrap();

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first.downcast::<u16>().unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_boxed_passes_error() {
        let mut instantiator = BoxCloneInstantiator::new(|| Err::<u8, _>(anyhow::anyhow!("no config file")));

        let err = instantiator.call().unwrap_err();
        assert_eq!(format!("{err}"), "no config file");
    }
}
