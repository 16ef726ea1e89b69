use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CatalogEntry, Cents, CommissionRate, ProviderId, ServiceCategory, Settlement, UserId,
};

pub type BookingId = Uuid;

/// Lifecycle of a booking. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested by a user, not yet taken by a provider
    Pending,
    /// Taken by a provider and being worked on
    InProgress,
    /// Done and settled; commission and payout are fixed
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" => Some(BookingStatus::Pending),
            // Providers historically marked taken jobs as "Accepted"
            "in_progress" | "accepted" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::InProgress => "In Progress",
            BookingStatus::Completed => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed)
    }

    /// Position in the lifecycle; a booking only ever moves forward.
    fn stage(&self) -> u8 {
        match self {
            BookingStatus::Pending => 0,
            BookingStatus::InProgress => 1,
            BookingStatus::Completed => 2,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A user's request for a catalog service on a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub service_category: ServiceCategory,
    pub service_name: String,
    /// Catalog price captured when the booking was made
    pub price_cents: Cents,
    pub booking_date: NaiveDate,
    pub provider_id: Option<ProviderId>,
    pub status: BookingStatus,
    pub commission_cents: Cents,
    pub payout_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a pending booking priced from the catalog.
    pub fn new(user_id: UserId, service: &CatalogEntry, booking_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            service_category: service.category,
            service_name: service.name.to_string(),
            price_cents: service.price_cents,
            booking_date,
            provider_id: None,
            status: BookingStatus::Pending,
            commission_cents: 0,
            payout_cents: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn settlement(&self) -> Settlement {
        Settlement {
            commission_cents: self.commission_cents,
            payout_cents: self.payout_cents,
        }
    }

    /// Check whether `status` may be set by a provider outside of completion.
    pub fn check_assignable(&self, status: BookingStatus) -> Result<(), TransitionError> {
        if self.is_completed() {
            return Err(TransitionError::AlreadyCompleted);
        }
        if status == BookingStatus::Completed {
            return Err(TransitionError::CompletionRequiresSettlement);
        }
        if status.stage() < self.status.stage() {
            return Err(TransitionError::Backwards {
                from: self.status,
                to: status,
            });
        }
        Ok(())
    }

    /// Settle the booking. Returns `None` when it was already completed,
    /// leaving the stored amounts untouched.
    pub fn complete(&mut self, rate: CommissionRate) -> Option<Settlement> {
        if self.is_completed() {
            return None;
        }
        let settlement = Settlement::compute(self.price_cents, rate);
        self.status = BookingStatus::Completed;
        self.commission_cents = settlement.commission_cents;
        self.payout_cents = settlement.payout_cents;
        Some(settlement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyCompleted,
    CompletionRequiresSettlement,
    Backwards {
        from: BookingStatus,
        to: BookingStatus,
    },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyCompleted => write!(f, "booking is already completed"),
            TransitionError::CompletionRequiresSettlement => {
                write!(f, "use completion to mark a booking as completed")
            }
            TransitionError::Backwards { from, to } => {
                write!(f, "cannot move a booking from {} back to {}", from, to)
            }
        }
    }
}

impl std::error::Error for TransitionError {}
