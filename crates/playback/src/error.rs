use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to connect media session: {0}")]
    ConnectFailed(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("No media loaded")]
    NothingLoaded,
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
