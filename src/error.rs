use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("corrupt stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Reset token is invalid or has expired")]
    InvalidToken,

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Project {0} not found")]
    ProjectNotFound(u64),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    /// Failures the user caused and can fix, as opposed to broken storage.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            FlowError::Storage(_) | FlowError::Serialization(_) | FlowError::Io(_)
        )
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
