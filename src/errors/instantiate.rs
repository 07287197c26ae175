/// Error returned by a user factory.
///
/// Resolving surfaces it as [`super::ResolveErrorKind::Instantiate`] without changing it.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
