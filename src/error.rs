use thiserror::Error;

use crate::feed::FeedError;
use crate::l10n::L10nError;
use crate::observer::SessionError;
use crate::reducer::ReducerError;
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Reducer error: {0}")]
    Reducer(#[from] ReducerError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Localization error: {0}")]
    L10n(#[from] L10nError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    // schema and event documents are decoded with serde_json
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
