use actix_web::HttpResponse;
use diesel::result::DatabaseErrorKind;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A referenced resource (cart, cart item, book, customer, address,
    /// order) does not exist. Carries the resource name for the response.
    #[error("{0} not found")]
    NotFound(String),

    /// Input failed validation before any mutation was applied.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The request was well-formed but conflicts with current state
    /// (empty cart at conversion, unique/restrict violations).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The authenticated principal lacks rights for the target resource.
    /// Verdicts come from the upstream identity collaborator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(resource.to_string())
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => AppError::NotFound("record".to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::InvalidState(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                AppError::InvalidState(info.message().to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(resource) => HttpResponse::NotFound().json(json!({
                "error": self.to_string(),
                "resource": resource,
            })),
            AppError::Validation { field, .. } => HttpResponse::BadRequest().json(json!({
                "error": self.to_string(),
                "field": field,
            })),
            AppError::InvalidState(_) => HttpResponse::Conflict().json(json!({
                "error": self.to_string()
            })),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(json!({
                "error": self.to_string()
            })),
            // Never leak storage internals to the client.
            AppError::Internal(_) => HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::not_found("cart").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_returns_400() {
        let resp = AppError::validation("quantity", "must be at least 1").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_state_returns_409() {
        let resp = AppError::InvalidState("cart is empty".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn forbidden_returns_403() {
        let resp = AppError::Forbidden("not your cart".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_display_names_the_resource() {
        assert_eq!(AppError::not_found("book").to_string(), "book not found");
    }

    #[test]
    fn validation_display_names_the_field() {
        assert_eq!(
            AppError::validation("score", "must be between 1 and 5").to_string(),
            "Invalid score: must be between 1 and 5"
        );
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: AppError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
