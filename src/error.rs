use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the item-state core.
///
/// Status-gate violations and listener-protocol misuse are programmer errors
/// ([`Error::IllegalState`] / [`Error::IllegalArgument`]) and are never wrapped.
/// Resolution and refresh failures from collaborators propagate via
/// [`Error::ItemStateError`], carrying the underlying cause.
#[derive(Error, Debug)]
pub enum Error {
    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("no such item: {0}")]
    NoSuchItem(String),

    #[error("item state error: {0}")]
    ItemStateError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),
}

impl Error {
    pub fn item_state(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::ItemStateError(Box::new(cause))
    }
}
