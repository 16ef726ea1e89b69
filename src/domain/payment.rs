use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where providers send the admin's commission. There is at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPaymentProfile {
    pub upi_id: String,
    pub bank_name: String,
    pub account_number: String,
    pub ifsc: String,
    pub updated_at: DateTime<Utc>,
}

impl AdminPaymentProfile {
    pub fn new(upi_id: String, bank_name: String, account_number: String, ifsc: String) -> Self {
        Self {
            upi_id,
            bank_name,
            account_number,
            ifsc: ifsc.trim().to_uppercase(),
            updated_at: Utc::now(),
        }
    }

    /// Names of the fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("upi_id", &self.upi_id),
            ("bank_name", &self.bank_name),
            ("account_number", &self.account_number),
            ("ifsc", &self.ifsc),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
