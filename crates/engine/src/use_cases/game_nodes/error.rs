//! Game node operation errors.

use questforge_domain::{GameError, GameId};

use crate::infrastructure::ports::RepoError;

/// Coarse outcome class for callers that map errors onto a transport
/// (HTTP status, CLI exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Internal,
}

/// Errors that can occur during game node operations.
#[derive(Debug, thiserror::Error)]
pub enum GameNodeError {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl GameNodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GameNotFound(_) => ErrorKind::NotFound,
            Self::Game(err) => match err {
                GameError::NodeNotFound { .. } => ErrorKind::NotFound,
                GameError::ForbiddenManipulation(_) => ErrorKind::Forbidden,
                GameError::NodeVerification(_)
                | GameError::RootNodeNotExists
                | GameError::NotRootNode { .. }
                | GameError::IllegalRootNodeType { .. } => ErrorKind::BadRequest,
            },
            Self::Repo(err) if err.is_not_found() => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}
