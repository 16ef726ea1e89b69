use std::fmt;

/// Money is represented as integer cents (paise) to avoid floating-point precision issues.
/// 1 rupee = 100 cents, so ₹500.00 = 50000 cents.
pub type Cents = i64;

/// Convert a whole currency amount into cents.
pub const fn units(amount: i64) -> Cents {
    amount * 100
}

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a non-negative decimal string into an integer scaled by `10^places`.
/// Example: parse_scaled("0.1", 4) -> 1000, parse_scaled("12.5", 2) -> 1250
///
/// More fractional digits than `places` is an error, not a truncation.
pub fn parse_scaled(input: &str, places: u32) -> Result<i64, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() || input.starts_with('-') {
        return Err(ParseAmountError::InvalidFormat);
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return Err(ParseAmountError::InvalidFormat);
    }
    if fraction.len() > places as usize {
        return Err(ParseAmountError::TooPrecise { places });
    }

    let scale = 10_i64.pow(places);
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| ParseAmountError::InvalidFormat)?
    };
    let fraction_value: i64 = if fraction.is_empty() {
        0
    } else {
        // Right-pad so "5" with 2 places means 50
        let padded = format!("{:0<width$}", fraction, width = places as usize);
        padded
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_value))
        .ok_or(ParseAmountError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    TooPrecise { places: u32 },
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid decimal format"),
            ParseAmountError::TooPrecise { places } => {
                write!(f, "at most {} decimal places are allowed", places)
            }
        }
    }
}

impl std::error::Error for ParseAmountError {}
