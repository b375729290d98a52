use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainError;

pub type ApiResult<T> = Result<T, ApiProblem>;

#[derive(Debug)]
pub struct ApiProblem {
    status: StatusCode,
    title: &'static str,
    detail: String,
    kind: &'static str,
    correlation_id: String,
}

impl ApiProblem {
    pub fn from_domain(error: DomainError) -> Self {
        Self::from_domain_with_correlation(error, None)
    }

    pub fn from_domain_with_correlation(
        error: DomainError,
        correlation_id: Option<String>,
    ) -> Self {
        let with_correlation = |status, title, kind, detail| {
            Self::new(status, title, kind, detail, correlation_id.clone())
        };

        match error {
            DomainError::Validation(detail) => with_correlation(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                "https://journeyboard.dev/problems/validation",
                detail,
            ),
            DomainError::NotFound(detail) => with_correlation(
                StatusCode::NOT_FOUND,
                "Not found",
                "https://journeyboard.dev/problems/not-found",
                detail,
            ),
            DomainError::Conflict(detail) => with_correlation(
                StatusCode::CONFLICT,
                "Conflict",
                "https://journeyboard.dev/problems/conflict",
                detail,
            ),
            DomainError::Internal(detail) => with_correlation(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "https://journeyboard.dev/problems/internal",
                detail,
            ),
        }
    }

    fn new(
        status: StatusCode,
        title: &'static str,
        kind: &'static str,
        detail: impl Into<String>,
        correlation_id: Option<String>,
    ) -> Self {
        Self {
            status,
            title,
            detail: detail.into(),
            kind,
            // Reuse the request id produced by the middleware so logs and the
            // response payload point at the same correlation key.
            correlation_id: correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    status: u16,
    detail: String,
    correlation_id: String,
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let payload = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            correlation_id: self.correlation_id,
        };

        let mut response = (self.status, Json(payload)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (DomainError::validation("v"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("n"), StatusCode::NOT_FOUND),
            (DomainError::conflict("c"), StatusCode::CONFLICT),
            (
                DomainError::internal("i"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            let problem = ApiProblem::from_domain(error);
            assert_eq!(problem.status, expected);
        }
    }

    #[test]
    fn correlation_id_is_preserved_when_provided() {
        let problem = ApiProblem::from_domain_with_correlation(
            DomainError::not_found("x"),
            Some("req-123".to_string()),
        );
        assert_eq!(problem.correlation_id, "req-123");
    }
}
