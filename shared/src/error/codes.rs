//! Unified error codes for the tee sheet service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Schedule errors
//! - 5xxx: Booking errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Too many requests from this address
    TooManyRequests = 1008,

    // ==================== 2xxx: Permission ====================
    /// Member account required
    MemberRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Member ====================
    /// Username already registered
    UsernameTaken = 3002,
    /// Username too short
    UsernameTooShort = 3003,
    /// Password too short
    PasswordTooShort = 3004,
    /// Display name required
    NameRequired = 3005,

    // ==================== 4xxx: Schedule ====================
    /// Tee time slot not found
    SlotNotFound = 4001,
    /// A slot already exists for this course and start time
    DuplicateSlot = 4002,
    /// Capacity outside the allowed range
    InvalidCapacity = 4003,
    /// Date could not be parsed
    InvalidDate = 4004,

    // ==================== 5xxx: Booking ====================
    /// Member already holds a booking in this slot
    AlreadyBooked = 5002,
    /// No free spot left in this slot
    SlotFull = 5003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            Self::ValidationFailed => "Validation failed",

            // Auth
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid username or password",
            Self::TokenExpired => "Token has expired",
            Self::TokenInvalid => "Invalid token",
            Self::TooManyRequests => "Too many requests, try again later",

            // Permission
            Self::MemberRequired => "Member account required",
            Self::AdminRequired => "Admin role required",

            // Member
            Self::UsernameTaken => "Username is already taken",
            Self::UsernameTooShort => "Username must be at least 3 characters",
            Self::PasswordTooShort => "Password must be at least 6 characters",
            Self::NameRequired => "Name is required",

            // Schedule
            Self::SlotNotFound => "Tee time not found",
            Self::DuplicateSlot => "A tee time already exists at that time",
            Self::InvalidCapacity => "Capacity must be between 1 and 8",
            Self::InvalidDate => "Invalid date, expected YYYY-MM-DD",

            // Booking
            Self::AlreadyBooked => "You already have a booking in that tee time",
            Self::SlotFull => "Tee time is fully booked",

            // System
            Self::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1008 => Ok(ErrorCode::TooManyRequests),

            // Permission
            2002 => Ok(ErrorCode::MemberRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Member
            3002 => Ok(ErrorCode::UsernameTaken),
            3003 => Ok(ErrorCode::UsernameTooShort),
            3004 => Ok(ErrorCode::PasswordTooShort),
            3005 => Ok(ErrorCode::NameRequired),

            // Schedule
            4001 => Ok(ErrorCode::SlotNotFound),
            4002 => Ok(ErrorCode::DuplicateSlot),
            4003 => Ok(ErrorCode::InvalidCapacity),
            4004 => Ok(ErrorCode::InvalidDate),

            // Booking
            5002 => Ok(ErrorCode::AlreadyBooked),
            5003 => Ok(ErrorCode::SlotFull),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
