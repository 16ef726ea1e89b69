use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceCategory;

pub type UserId = Uuid;
pub type ProviderId = Uuid;

/// Canonical form used for storing and comparing emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A customer who requests services. Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the password itself
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub mobile: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: &str,
        password_hash: String,
        mobile: String,
        address: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            password_hash,
            mobile,
            address,
            created_at: Utc::now(),
        }
    }
}

/// A tradesperson offering exactly one category of service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub category: ServiceCategory,
    pub email: String,
    /// Argon2 PHC string, never the password itself
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(name: String, category: ServiceCategory, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            email: normalize_email(email),
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn can_serve(&self, category: ServiceCategory) -> bool {
        self.category == category
    }
}
