use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::RepositoryError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid user id: '{0}'")]
    InvalidIdentity(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("{0}")]
    Canceled(String),

    #[error("{0}")]
    DeadlineExceeded(String),

    #[error("Persistence error: {0}")]
    Persistence(#[source] RepositoryError),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::NotFound(_))
    }
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidIdentity(id) => UserError::InvalidIdentity(id),
            RepositoryError::NotFound { key, .. } => UserError::NotFound(key),
            RepositoryError::Canceled { .. } => UserError::Canceled(err.to_string()),
            RepositoryError::DeadlineExceeded { .. } => UserError::DeadlineExceeded(err.to_string()),
            RepositoryError::Persistence { .. } => UserError::Persistence(err),
        }
    }
}

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidIdentity(id) => {
                AppError::InvalidIdentity(format!("'{}' is not a valid user id", id))
            }
            UserError::NotFound(key) => AppError::NotFound(format!("User not found ({})", key)),
            UserError::DuplicateEmail(email) => {
                AppError::Conflict(format!("User with email '{}' already exists", email))
            }
            UserError::Validation(errors) => AppError::ValidationError(errors),
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
            UserError::Canceled(msg) => AppError::ServiceUnavailable(msg),
            UserError::DeadlineExceeded(msg) => AppError::GatewayTimeout(msg),
            UserError::Persistence(source) => AppError::Database(source.to_string()),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
