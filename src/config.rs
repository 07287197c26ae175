/// Config for a [`crate::TypeRegistry`]
/// ## Fields
/// - `allow_reassignment`:
///   If `true`, registering a type that already has a slot replaces that slot.
///   If `false`, such a registration fails with [`crate::ResolveErrorKind::AlreadyRegistered`]
///   and the existing slot is kept.
///
///   Async factories and async lazy singletons are re-registered on every
///   `get_or_register_async` call, so with `false` only their first call succeeds.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub allow_reassignment: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { allow_reassignment: true }
    }
}
