use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use marketplace_engine::{AccountApiError, AnalyticsError, AuthApiError, BlogApiError, CatalogError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound => StatusCode::UNAUTHORIZED,
                AuthError::AccountDisabled => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("The access token is invalid. {0}")]
    InvalidToken(String),
    #[error("Invalid username, email or password.")]
    InvalidCredentials,
    #[error("This account has been disabled.")]
    AccountDisabled,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("User account not found.")]
    AccountNotFound,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::AccountDisabled => Self::AuthenticationError(AuthError::AccountDisabled),
            AuthApiError::UsernameTaken | AuthApiError::EmailTaken => Self::Conflict(e.to_string()),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::ValidationError(s) => Self::ValidationError(s),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::RoleNotFound => {
                Self::BackendError(format!("Role definitions in Database and Code have diverged. {e}"))
            },
            AuthApiError::PasswordHashError(s) => {
                error!("🔑️ Password hashing failed. {s}");
                Self::BackendError(format!("Could not hash password. {s}"))
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AccountApiError::QueryError(s) => Self::InvalidQuery(s),
            AccountApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AccountApiError::ValidationError(s) => Self::ValidationError(s),
            AccountApiError::CannotDisableSelf => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::NotOwner => Self::InsufficientPermissions(e.to_string()),
            CatalogError::ValidationError(s) => Self::ValidationError(s),
            CatalogError::IllegalTransition { .. } | CatalogError::ProductHasOrders | CatalogError::Conflict => {
                Self::Conflict(e.to_string())
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Forbidden => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::ValidationError(s) => Self::ValidationError(s),
            OrderFlowError::ProductNotForSale |
            OrderFlowError::CannotBuyOwnProduct |
            OrderFlowError::AlreadyPurchased(_) |
            OrderFlowError::SellerHasNoWallet |
            OrderFlowError::IllegalTransition { .. } |
            OrderFlowError::DuplicateTxHash |
            OrderFlowError::DeliveryNotAvailable(_) |
            OrderFlowError::Conflict => Self::Conflict(e.to_string()),
        }
    }
}

impl From<BlogApiError> for ServerError {
    fn from(e: BlogApiError) -> Self {
        match e {
            BlogApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            BlogApiError::PostNotFound => Self::NoRecordFound(e.to_string()),
            BlogApiError::SlugTaken => Self::Conflict(e.to_string()),
            BlogApiError::ValidationError(s) => Self::ValidationError(s),
        }
    }
}

impl From<AnalyticsError> for ServerError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AnalyticsError::ValidationError(s) => Self::ValidationError(s),
        }
    }
}
