use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bims_core::DomainError;
use bims_infra::error::RepoError;

pub fn repo_error_to_response(err: RepoError) -> axum::response::Response {
    match err {
        RepoError::Domain(e) => domain_error_to_response(e),
        RepoError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "not authorized")
        }
    }
}

pub fn forbidden(err: bims_auth::AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path segment into a typed id; bad input maps to a 400.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_forbidden() {
        let resp = domain_error_to_response(DomainError::Unauthorized);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invariant_violation_maps_to_unprocessable() {
        let resp = domain_error_to_response(DomainError::invariant("insufficient stock"));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
