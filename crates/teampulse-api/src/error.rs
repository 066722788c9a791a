//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; any `AppError` converts with `?` and is
//! rendered as an [`ErrorResponse`] with the status its [`ErrorMetadata`] names.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use teampulse_core::{AppError, ErrorMetadata, LogLevel};
use validator::Validate;

pub use teampulse_infra::ErrorResponse;

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that rejects malformed bodies and failed `validator` rules with
/// the standard 400 error body.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        inner.validate().map_err(AppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), error_type = error_type, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| {
            let env = env.to_lowercase();
            env == "production" || env == "prod"
        })
        .unwrap_or(false)
}

/// Build the response body for an error. Details are omitted in production and for
/// errors flagged sensitive.
pub fn error_body(app_error: &AppError, is_production: bool) -> ErrorResponse {
    let show_details = !is_production && !app_error.is_sensitive();
    ErrorResponse {
        error: app_error.client_message(),
        details: show_details.then(|| app_error.detailed_message()),
        error_type: show_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(error_body(app_error, is_production_env()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shows_details_outside_production() {
        let err = AppError::BadRequest("Team name already exists".to_string());
        let body = error_body(&err, false);
        assert_eq!(body.error, "Team name already exists");
        assert_eq!(body.code, "BAD_REQUEST");
        assert_eq!(body.error_type.as_deref(), Some("BadRequest"));
        assert!(body.details.is_some());
    }

    #[test]
    fn test_error_body_hides_details_in_production() {
        let err = AppError::NotFound("Team not found".to_string());
        let body = error_body(&err, true);
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
        assert_eq!(body.error, "Team not found");
    }

    #[test]
    fn test_sensitive_errors_never_leak_details() {
        let err = AppError::external("clerk", Some(500), "upstream stack trace");
        let body = error_body(&err, false);
        assert!(body.details.is_none());
        assert_eq!(body.code, "EXTERNAL_SERVICE_ERROR");
        assert!(body.recoverable);
    }

    #[test]
    fn test_status_mapping() {
        let response = HttpAppError(AppError::InvitationLimitReached {
            pending: 10,
            limit: 10,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response =
            HttpAppError(AppError::OrganizationNotFound("org_1".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
