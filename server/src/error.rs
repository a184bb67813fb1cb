//! Error types for the relay server

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

/// Failure to queue a frame on a client's outbound channel
///
/// Sends never wait: a full queue means the client is not keeping up, a
/// closed queue means its writer task has already gone away. Either way the
/// frame is dropped for that client only.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection is closed")]
    Closed,
}

impl<T> From<TrySendError<T>> for SendError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::Closed,
        }
    }
}
