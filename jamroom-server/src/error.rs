use jamroom_core::ErrorCode;
use std::net::SocketAddr;
use thiserror::Error;

/// Admission failures reported back to the requester. The transport stays open.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    #[error("room not found")]
    RoomNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("room is full")]
    RoomFull,
}

impl JoinError {
    pub fn code(&self) -> ErrorCode {
        match self {
            JoinError::RoomNotFound => ErrorCode::RoomNotFound,
            JoinError::WrongPassword => ErrorCode::WrongPassword,
            JoinError::RoomFull => ErrorCode::RoomFull,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
    #[error("coordinator is not running")]
    CoordinatorGone,
}
