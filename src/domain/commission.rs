use serde::{Deserialize, Serialize};

use super::{Cents, ParseAmountError, parse_scaled};

const BASIS_POINTS_PER_UNIT: i64 = 10_000;

/// Share of a completed booking's price kept by the admin.
/// Stored in basis points so that 0.10 is exactly 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate {
    basis_points: u32,
}

impl CommissionRate {
    /// The marketplace's standard 10% cut.
    pub const DEFAULT: CommissionRate = CommissionRate {
        basis_points: 1_000,
    };

    pub fn from_basis_points(basis_points: u32) -> Result<Self, CommissionRateError> {
        if i64::from(basis_points) > BASIS_POINTS_PER_UNIT {
            return Err(CommissionRateError::OutOfRange);
        }
        Ok(Self { basis_points })
    }

    /// Parse a decimal fraction such as "0.10" or "0.125".
    pub fn parse(input: &str) -> Result<Self, CommissionRateError> {
        let bps = parse_scaled(input, 4).map_err(CommissionRateError::Parse)?;
        let bps = u32::try_from(bps).map_err(|_| CommissionRateError::OutOfRange)?;
        Self::from_basis_points(bps)
    }

    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }

    /// Commission owed on `price`, rounded half-up to the cent.
    pub fn commission_on(&self, price: Cents) -> Cents {
        let raw = i128::from(price) * i128::from(self.basis_points);
        let half = i128::from(BASIS_POINTS_PER_UNIT / 2);
        ((raw + half) / i128::from(BASIS_POINTS_PER_UNIT)) as Cents
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::str::FromStr for CommissionRate {
    type Err = CommissionRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.basis_points / 10_000;
        let fraction = self.basis_points % 10_000;
        let fraction = format!("{:04}", fraction);
        // Always keep at least two decimals: 0.10, 0.125
        let trimmed = fraction.trim_end_matches('0');
        let shown = if trimmed.len() < 2 { &fraction[..2] } else { trimmed };
        write!(f, "{}.{}", whole, shown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionRateError {
    Parse(ParseAmountError),
    OutOfRange,
}

impl std::fmt::Display for CommissionRateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionRateError::Parse(e) => write!(f, "invalid commission rate: {}", e),
            CommissionRateError::OutOfRange => {
                write!(f, "commission rate must be between 0 and 1")
            }
        }
    }
}

impl std::error::Error for CommissionRateError {}

/// The split of a completed booking's price between admin and provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub commission_cents: Cents,
    pub payout_cents: Cents,
}

impl Settlement {
    /// Nothing settled yet.
    pub const ZERO: Settlement = Settlement {
        commission_cents: 0,
        payout_cents: 0,
    };

    /// Split `price` so that commission + payout == price exactly.
    pub fn compute(price: Cents, rate: CommissionRate) -> Self {
        let commission_cents = rate.commission_on(price);
        Self {
            commission_cents,
            payout_cents: price - commission_cents,
        }
    }

    pub fn total(&self) -> Cents {
        self.commission_cents + self.payout_cents
    }
}
