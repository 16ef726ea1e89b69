use thiserror::Error;

use crate::domain::{BookingId, ServiceCategory};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("A {role} with email {email} is already registered")]
    DuplicateEmail { role: &'static str, email: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    #[error("Provider serves {provider_category}, but booking {booking_id} needs {booking_category}")]
    CategoryMismatch {
        booking_id: BookingId,
        booking_category: ServiceCategory,
        provider_category: ServiceCategory,
    },

    #[error("Booking {booking_id} cannot change: {reason}")]
    InvalidTransition {
        booking_id: BookingId,
        reason: String,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures caused by who is asking rather than what is asked.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized(_) | AppError::InvalidCredentials | AppError::CategoryMismatch { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::BookingNotFound(_) | AppError::UserNotFound(_) | AppError::ProviderNotFound(_)
        )
    }
}
