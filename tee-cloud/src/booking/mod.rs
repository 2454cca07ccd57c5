//! Reservation and cancellation protocols
//!
//! Each call runs as one [`BookingTx`](crate::store::BookingTx): it commits
//! fully or rolls back fully. Callers never retry on their own.

mod cancel;
mod reserve;

pub use cancel::cancel_booking;
pub use reserve::book_spot;

use shared::error::{AppError, ErrorCode};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("member already holds a booking in this slot")]
    AlreadyBooked,
    #[error("no free spot left in this slot")]
    SlotFull,
    #[error("booking storage failure: {0}")]
    Unknown(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::AlreadyBooked => AppError::new(ErrorCode::AlreadyBooked),
            BookingError::SlotFull => AppError::new(ErrorCode::SlotFull),
            BookingError::Unknown(e) => {
                tracing::error!(error = %e, "Booking storage error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}
