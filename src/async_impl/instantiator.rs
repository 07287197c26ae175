use alloc::{boxed::Box, sync::Arc};
use core::future::Future;
use tracing::error;

use crate::{any::RcAny, errors::InstantiateErrorKind, utils::future::BoxFuture};

/// Zero-argument producer of an instance that completes asynchronously.
///
/// Implemented for every cloneable `FnMut() -> Fut` closure (including `async ||` ones)
/// where `Fut` resolves to `Result<T, E>` and `E` converts into [`InstantiateErrorKind`].
pub trait Instantiator: Clone + 'static {
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self) -> impl Future<Output = Result<Self::Provides, Self::Error>> + Send;
}

impl<F, Fut, Response, Err> Instantiator for F
where
    F: FnMut() -> Fut + Send + Clone + 'static,
    Fut: Future<Output = Result<Response, Err>> + Send,
    Response: 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&mut self) -> impl Future<Output = Result<Self::Provides, Self::Error>> + Send {
        self()
    }
}

pub(crate) trait CloneInstantiator {
    fn call(&self) -> BoxFuture<'static, Result<RcAny, InstantiateErrorKind>>;

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
    fn call(&self) -> BoxFuture<'static, Result<RcAny, InstantiateErrorKind>> {
        let mut instantiator = self.0.clone();

        Box::pin(async move {
            match instantiator.instantiate().await {
                Ok(instance) => Ok(Arc::new(instance) as _),
                Err(err) => {
                    let err = err.into();
                    error!("{}", err);
                    Err(err)
                }
            }
        })
    }

    #[inline]
    fn clone_box(&self) -> Box<dyn CloneInstantiator + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Type-erased async instantiator stored in a registry slot
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

    /// The returned future owns a clone of the instantiator, so it doesn't borrow the slot
    #[inline]
    pub(crate) fn call(&self) -> BoxFuture<'static, Result<RcAny, InstantiateErrorKind>> {
        self.0.call()
    }
}

impl Clone for BoxCloneInstantiator {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}
