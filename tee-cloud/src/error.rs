//! Handler-level error bridge
//!
//! `ServiceError` lets handlers that talk to the store directly use `?` on
//! both [`StoreError`] and [`AppError`]. Storage failures are logged here and
//! reach the client as a bare `InternalError`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::store::StoreError;

#[derive(Debug)]
pub enum ServiceError {
    /// Storage failure (logged, detail withheld from the client)
    Store(StoreError),
    /// Business-rule error, passed through unchanged
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(err) => {
                tracing::error!(error = %err, "Service storage error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_detail_is_withheld() {
        let err: AppError =
            ServiceError::from(StoreError::Integrity("fk bookings_slot_id".into())).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("bookings"));
    }

    #[test]
    fn app_errors_pass_through() {
        let err: AppError = ServiceError::from(AppError::new(ErrorCode::SlotNotFound)).into();
        assert_eq!(err.code, ErrorCode::SlotNotFound);
    }
}
