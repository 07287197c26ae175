pub(crate) mod instantiator;
pub(crate) mod registrar;
pub(crate) mod registry;

pub use instantiator::Instantiator;
pub use registry::AsyncRegistry;
