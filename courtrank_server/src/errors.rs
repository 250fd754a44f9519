use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use courtrank_engine::{ChallengeApiError, MatchFlowError, PlayerApiError, RatingApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    /// A request that was well-formed and authorized, but arrived when the state machine does not allow it.
    /// Carries the stable snake_case reason code that clients switch on.
    #[error("{0}")]
    NotAllowed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NotAllowed(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::ForbiddenAdmin => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
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
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Admin secret missing or incorrect.")]
    ForbiddenAdmin,
}

impl From<MatchFlowError> for ServerError {
    fn from(e: MatchFlowError) -> Self {
        match e {
            MatchFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
            MatchFlowError::MatchNotFound(_) => Self::NoRecordFound(e.to_string()),
            MatchFlowError::NotAParticipant(..) => Self::InsufficientPermissions(e.to_string()),
            MatchFlowError::PlayerError(pe) => Self::from(pe),
            MatchFlowError::OpponentRequired(_) => Self::NotAllowed("opponent_required".to_string()),
            MatchFlowError::ScoreAlreadySubmitted(_) => Self::NotAllowed("score_already_submitted".to_string()),
            MatchFlowError::InvalidScore => Self::NotAllowed("invalid_score".to_string()),
            MatchFlowError::NoPendingResult(_) => Self::NotAllowed("no_pending_result".to_string()),
            MatchFlowError::AlreadyFinalized(_) => Self::NotAllowed("already_finalized".to_string()),
            MatchFlowError::PosterCannotConfirm => Self::NotAllowed("poster_cannot_confirm".to_string()),
            MatchFlowError::PosterCannotContest => Self::NotAllowed("poster_cannot_contest".to_string()),
        }
    }
}

impl From<RatingApiError> for ServerError {
    fn from(e: RatingApiError) -> Self {
        match &e {
            RatingApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            RatingApiError::MatchNotFound(_) | RatingApiError::PlayerNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}

impl From<PlayerApiError> for ServerError {
    fn from(e: PlayerApiError) -> Self {
        match &e {
            PlayerApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            PlayerApiError::PlayerNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}

impl From<ChallengeApiError> for ServerError {
    fn from(e: ChallengeApiError) -> Self {
        match &e {
            ChallengeApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            ChallengeApiError::ChallengeNotFound(_) | ChallengeApiError::InviteNotFound => {
                Self::NoRecordFound(e.to_string())
            },
            ChallengeApiError::NotTheRecipient | ChallengeApiError::NotTheSender => {
                Self::InsufficientPermissions(e.to_string())
            },
            _ => Self::NotAllowed(e.to_string()),
        }
    }
}
