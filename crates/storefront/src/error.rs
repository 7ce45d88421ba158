//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding to the client. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::commerce::CommerceError;
use crate::models::CartStorageError;

/// Seconds a client should wait before retrying a remote failure.
const RETRY_AFTER_SECS: &str = "5";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart, stock or checkout operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Catalog read failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart could not be read from or written to the session.
    #[error("Session error: {0}")]
    Session(#[from] CartStorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Message safe to show to the shopper.
    pub error: String,
    /// Whether retrying the same request may succeed.
    pub retryable: bool,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
                CommerceError::LineNotFound { .. }
                | CommerceError::ProductNotFound(_)
                | CommerceError::ColorNotFound { .. } => StatusCode::NOT_FOUND,
                CommerceError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CommerceError::EmptyCart
                | CommerceError::BelowMinimum { .. }
                | CommerceError::MissingField(_)
                | CommerceError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CommerceError::ChannelUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
                CommerceError::RemoteUnavailable(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Commerce(CommerceError::RemoteUnavailable(_))
                | Self::Catalog(CatalogError::Unavailable(_))
        )
    }

    const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Commerce(CommerceError::ChannelUnconfigured)
                | Self::Catalog(CatalogError::InvalidDocument { .. })
                | Self::Session(_)
                | Self::Internal(_)
        )
    }

    // Don't expose internal error details to clients
    fn user_message(&self) -> String {
        match self {
            Self::Commerce(err) => err.user_message(),
            Self::Catalog(CatalogError::NotFound(_)) => "Produto não encontrado.".to_string(),
            Self::Catalog(_) => "Erro ao carregar produtos. Tente novamente.".to_string(),
            Self::Session(_) | Self::Internal(_) => {
                "Erro interno. Tente novamente mais tarde.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if self.is_retryable() {
            tracing::warn!(error = %self, "Remote service unavailable");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let retryable = self.is_retryable();
        let body = ErrorBody {
            error: self.user_message(),
            retryable,
        };

        let mut response = (status, Json(body)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "abc123"), ("color", "Rosa")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use vitrine_core::ProductId;

    use super::*;
    use crate::commerce::CustomerField;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Internal("boom".to_string());
        assert_eq!(err.to_string(), "Internal error: boom");

        let err = AppError::from(CommerceError::EmptyCart);
        assert_eq!(err.to_string(), "Commerce error: cart is empty");
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert_eq!(
            get_status(CommerceError::InvalidQuantity { quantity: 0 }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CommerceError::BelowMinimum {
                    item_count: 9,
                    minimum: 10
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CommerceError::MissingField(CustomerField::Cep).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                CommerceError::InsufficientStock {
                    product_id: ProductId::new("p1"),
                    color: "Azul".to_string(),
                    requested: 6,
                    available: 5,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CommerceError::ProductNotFound(ProductId::new("p1")).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_remote_failures_carry_retry_hint() {
        let response =
            AppError::from(CommerceError::RemoteUnavailable("timeout".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get(RETRY_AFTER),
            Some(&HeaderValue::from_static(RETRY_AFTER_SECS))
        );

        let response = AppError::from(CatalogError::Unavailable("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().contains_key(RETRY_AFTER));
    }

    #[test]
    fn test_server_faults() {
        assert_eq!(
            get_status(CommerceError::ChannelUnconfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("password=hunter2".to_string());
        assert!(!err.user_message().contains("hunter2"));
    }
}
