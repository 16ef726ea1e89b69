use crate::domain::CommissionRate;

/// Credentials accepted by the admin login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Settings injected into the marketplace service.
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Admin's share of each completed booking (0.10 unless overridden)
    pub commission_rate: CommissionRate,
    pub admin: AdminCredentials,
}

impl LedgerConfig {
    pub fn with_commission_rate(mut self, rate: CommissionRate) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_admin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin = AdminCredentials {
            username: username.into(),
            password: password.into(),
        };
        self
    }
}
