//! Error mapping - every failure leaves the server as an RFC 7807 body.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use conduit_core::DomainError;
use conduit_shared::ErrorResponse;

/// Seconds a client should wait before retrying a transient storage failure.
const UPSTREAM_RETRY_AFTER_SECS: u64 = 1;

/// Request body name of a domain field.
fn wire_field(field: &str) -> &str {
    match field {
        "handle" => "username",
        "contact" => "email",
        "login" => "username",
        other => other,
    }
}

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed request: unparsable JSON, query string or path segment.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests, retry after {retry_after}s")]
    TooManyRequests { retry_after: u64 },
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Conflict { .. } => StatusCode::CONFLICT,
                DomainError::Upstream {
                    retryable: true, ..
                } => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        let body = match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(fields) => fields.iter().fold(
                    ErrorResponse::unprocessable().with_detail("One or more fields are invalid."),
                    |body, f| body.with_field_error(wire_field(&f.field), &f.message),
                ),
                DomainError::Unauthenticated => ErrorResponse::unauthorized()
                    .with_detail("A valid access token is required."),
                DomainError::Forbidden(reason) => ErrorResponse::forbidden(reason),
                DomainError::NotFound { entity_type, key } => {
                    ErrorResponse::not_found(format!("{entity_type} {key} not found"))
                }
                DomainError::Conflict { field } => {
                    let field = wire_field(field);
                    ErrorResponse::conflict(format!("{field} is already taken"))
                        .with_field_error(field, "has already been taken")
                }
                DomainError::Upstream {
                    message,
                    retryable: true,
                } => {
                    tracing::warn!(error = %message, "Transient storage failure");
                    response.insert_header((
                        header::RETRY_AFTER,
                        UPSTREAM_RETRY_AFTER_SECS.to_string(),
                    ));
                    ErrorResponse::service_unavailable()
                        .with_detail("Storage is temporarily unavailable.")
                }
                DomainError::Upstream { message, .. } => {
                    tracing::error!(error = %message, "Storage failure");
                    ErrorResponse::internal_error()
                }
            },
            AppError::BadRequest(detail) => {
                ErrorResponse::new(400, "Bad Request").with_detail(detail.clone())
            }
            AppError::TooManyRequests { retry_after } => {
                response.insert_header((header::RETRY_AFTER, retry_after.to_string()));
                ErrorResponse::too_many_requests()
                    .with_detail(format!("Try again in {retry_after} seconds."))
            }
        };

        response.json(body)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::header::HeaderMap;
    use conduit_core::FieldError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value, HeaderMap) {
        let response = err.error_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), headers)
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let err = AppError::from(DomainError::Validation(vec![
            FieldError::new("handle", "can't be blank"),
            FieldError::new("password", "is too short"),
        ]));

        let (status, json, _) = body_json(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["errors"]["username"][0], "can't be blank");
        assert_eq!(json["errors"]["password"][0], "is too short");
    }

    #[tokio::test]
    async fn test_conflict_names_field() {
        let (status, json, _) = body_json(DomainError::conflict("handle").into()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["errors"]["username"].is_array());
        assert_eq!(json["detail"], "username is already taken");
    }

    #[tokio::test]
    async fn test_retryable_upstream_sets_retry_after() {
        let err = AppError::from(DomainError::Upstream {
            message: "pool exhausted".to_string(),
            retryable: true,
        });

        let (status, json, headers) = body_json(err).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(headers.contains_key(header::RETRY_AFTER));
        assert!(!json["detail"].as_str().unwrap().contains("pool"));
    }

    #[tokio::test]
    async fn test_permanent_upstream_hides_message() {
        let err = AppError::from(DomainError::Upstream {
            message: "syntax error at or near".to_string(),
            retryable: false,
        });

        let (status, json, _) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(DomainError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(DomainError::Forbidden("no".into())).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(DomainError::not_found("article", "x")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::TooManyRequests { retry_after: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
