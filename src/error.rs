use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Business and persistence errors surfaced by the leave core.
///
/// Every rejected precondition carries its own variant with a distinct
/// message so callers (and tests) can tell them apart.
#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("invalid date range: {0}")]
    InvalidDateRange(&'static str),

    #[error("an overlapping leave request already exists for these dates")]
    OverlappingRequest,

    #[error("only {remaining} summer leaves remaining")]
    InsufficientSummerLeave { remaining: u32 },

    #[error("leave request is not pending")]
    NotPending,

    #[error("employee {0} not found")]
    AccountNotFound(u64),

    #[error("leave request {0} not found")]
    RequestNotFound(u64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LeaveError {
    pub const END_BEFORE_START: &'static str = "end date falls before start date";
    pub const START_NOT_IN_FUTURE: &'static str = "cannot apply leave for today or previous days";
}

impl actix_web::ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidDateRange(_)
            | LeaveError::InsufficientSummerLeave { .. }
            | LeaveError::NotPending => StatusCode::BAD_REQUEST,
            LeaveError::OverlappingRequest => StatusCode::CONFLICT,
            LeaveError::AccountNotFound(_) | LeaveError::RequestNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LeaveError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Persistence faults are logged with detail but reported generically.
        let message = match self {
            LeaveError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_business_error_has_a_distinct_message() {
        let errors = [
            LeaveError::InvalidDateRange(LeaveError::END_BEFORE_START),
            LeaveError::InvalidDateRange(LeaveError::START_NOT_IN_FUTURE),
            LeaveError::OverlappingRequest,
            LeaveError::InsufficientSummerLeave { remaining: 2 },
            LeaveError::NotPending,
            LeaveError::AccountNotFound(7),
            LeaveError::RequestNotFound(7),
        ];

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn summer_error_reports_remaining_count() {
        let err = LeaveError::InsufficientSummerLeave { remaining: 3 };
        assert_eq!(err.to_string(), "only 3 summer leaves remaining");
    }
}
