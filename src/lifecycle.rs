use core::fmt::{self, Display, Formatter};

/// Policy that decides when an instance is created and whether it is shared.
///
/// The first three are accepted by [`crate::Registrar::get_or_register`],
/// the `*Async` ones by `Registrar::get_or_register_async`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    /// Factory is called once, right away, and its value is stored as is
    Singleton,
    /// Factory is stored and called on every fetch
    Factory,
    /// Factory is stored and called on the first fetch, the value is cached after that
    LazySingleton,
    FactoryAsync,
    LazySingletonAsync,
    SingletonAsync,
    #[cfg(test)]
    Unsupported,
}

impl Lifecycle {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Lifecycle::Singleton => "singleton",
            Lifecycle::Factory => "factory",
            Lifecycle::LazySingleton => "lazy_singleton",
            Lifecycle::FactoryAsync => "factory_async",
            Lifecycle::LazySingletonAsync => "lazy_singleton_async",
            Lifecycle::SingletonAsync => "singleton_async",
            #[cfg(test)]
            Lifecycle::Unsupported => "unsupported",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(
            self,
            Lifecycle::FactoryAsync | Lifecycle::LazySingletonAsync | Lifecycle::SingletonAsync
        )
    }
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
