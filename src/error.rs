use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::guard::Malformed;

/// Rejections returned to the client. The messages are fixed; parser or
/// matcher details are never exposed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectError {
    #[error("Invalid destination")]
    MissingDestination,

    #[error("Invalid destination URL format")]
    InvalidDestinationFormat,

    #[error("Unauthorized redirect destination")]
    UnauthorizedDestination,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl RejectError {
    pub fn status(&self) -> StatusCode {
        match self {
            RejectError::MissingDestination | RejectError::InvalidDestinationFormat => {
                StatusCode::BAD_REQUEST
            }
            RejectError::UnauthorizedDestination => StatusCode::FORBIDDEN,
            RejectError::NotFound => StatusCode::NOT_FOUND,
            RejectError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RejectError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> String {
        let body = ErrorBody {
            error: self.to_string(),
        };
        serde_json::to_string(&body).unwrap_or_else(|_| format!("{{\"error\":\"{self}\"}}"))
    }
}

impl From<Malformed> for RejectError {
    fn from(malformed: Malformed) -> Self {
        match malformed {
            Malformed::Missing => RejectError::MissingDestination,
            Malformed::InvalidFormat => RejectError::InvalidDestinationFormat,
        }
    }
}
