//! Error taxonomy for both halves of the dashboard.
//!
//! The browser side only ever sees [`ClientError`]: a request either never
//! reached the server, came back with a non-2xx status, or returned a body we
//! could not decode. The server side raises [`ApiError`], which renders itself
//! as the JSON error envelope.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is already human-readable.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Browser storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 means the stored token is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Access denied: this dashboard is for administrators only")]
    NotAdmin,

    #[error("Stored session is unreadable: {0}")]
    Corrupt(String),
}

#[cfg(feature = "ssr")]
pub use server::ApiError;

#[cfg(feature = "ssr")]
mod server {
    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, ResponseError};
    use thiserror::Error;

    use crate::models::envelope::ErrorBody;

    #[derive(Error, Debug)]
    pub enum ApiError {
        #[error("Validation failed")]
        Validation(Vec<String>),

        #[error("{0}")]
        BadRequest(String),

        #[error("Authentication required")]
        Unauthorized,

        #[error("Invalid email or password")]
        InvalidCredentials,

        #[error("Administrator role required")]
        Forbidden,

        #[error("{0} not found")]
        NotFound(&'static str),

        #[error("{0}")]
        Conflict(String),

        #[error("File exceeds the {0} byte limit")]
        TooLarge(usize),

        #[error("Database error: {0}")]
        Database(#[from] rusqlite::Error),

        #[error("Storage error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Password hashing failed: {0}")]
        Hashing(String),
    }

    impl ApiError {
        /// A write that lost the race for a unique email surfaces as 409,
        /// like the pre-check in front of it. Other failures stay internal.
        pub fn email_conflict(err: rusqlite::Error) -> ApiError {
            match &err {
                rusqlite::Error::SqliteFailure(failure, Some(message))
                    if failure.code == rusqlite::ErrorCode::ConstraintViolation
                        && message.contains("users.email") =>
                {
                    ApiError::Conflict("Email is already in use".to_string())
                }
                _ => ApiError::Database(err),
            }
        }

        pub fn body(&self) -> ErrorBody {
            let message = match self {
                // Internals stay in the server log.
                ApiError::Database(_) | ApiError::Io(_) | ApiError::Hashing(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            };
            let errors = match self {
                ApiError::Validation(errors) => errors.clone(),
                _ => Vec::new(),
            };
            ErrorBody {
                success: false,
                message,
                errors,
            }
        }
    }

    impl ResponseError for ApiError {
        fn status_code(&self) -> StatusCode {
            match self {
                ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                ApiError::Forbidden => StatusCode::FORBIDDEN,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Conflict(_) => StatusCode::CONFLICT,
                ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                ApiError::Database(_) | ApiError::Io(_) | ApiError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }

        fn error_response(&self) -> HttpResponse {
            if self.status_code().is_server_error() {
                leptos::logging::error!("[API ERROR] {}", self);
            }
            HttpResponse::build(self.status_code()).json(self.body())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn validation_errors_are_listed_in_body() {
            let err = ApiError::Validation(vec!["Name is required".into()]);
            assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = err.body();
            assert!(!body.success);
            assert_eq!(body.errors, vec!["Name is required".to_string()]);
        }

        #[tokio::test]
        async fn duplicate_email_insert_is_a_conflict() {
            use crate::db::Database;
            use crate::models::user::UserInput;

            let db = Database::new(":memory:").unwrap();
            db.create_schema().await.unwrap();
            let input = UserInput {
                name: "Ines".into(),
                email: "ines@shop.test".into(),
                ..Default::default()
            };
            db.insert_user(&input, "hash").await.unwrap();
            let err = db.insert_user(&input, "hash").await.unwrap_err();

            let err = ApiError::email_conflict(err);
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
            assert_eq!(err.to_string(), "Email is already in use");
            assert!(matches!(
                ApiError::email_conflict(rusqlite::Error::QueryReturnedNoRows),
                ApiError::Database(_)
            ));
        }

        #[test]
        fn internal_errors_do_not_leak_details() {
            let err = ApiError::Hashing("salt too short".into());
            assert_eq!(err.body().message, "Internal server error");
        }
    }
}
