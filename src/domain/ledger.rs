use std::collections::HashMap;

use super::{Booking, BookingStatus, Cents, ProviderId};

/// Total commission earned by the admin: the sum over completed bookings only.
pub fn total_admin_profit(bookings: &[Booking]) -> Cents {
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .map(|b| b.commission_cents)
        .sum()
}

/// Payout earned by each provider across their completed bookings.
pub fn provider_earnings(bookings: &[Booking]) -> HashMap<ProviderId, Cents> {
    let mut earnings: HashMap<ProviderId, Cents> = HashMap::new();

    for booking in bookings.iter().filter(|b| b.is_completed()) {
        if let Some(provider) = booking.provider_id {
            *earnings.entry(provider).or_insert(0) += booking.payout_cents;
        }
    }

    earnings
}

/// Bookings that break the settlement invariant. An empty result means the
/// ledger is consistent.
pub fn settlement_violations(bookings: &[Booking]) -> Vec<&Booking> {
    bookings
        .iter()
        .filter(|b| {
            if b.is_completed() {
                b.commission_cents + b.payout_cents != b.price_cents
                    || b.commission_cents < 0
                    || b.payout_cents < 0
            } else {
                b.commission_cents != 0 || b.payout_cents != 0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{CommissionRate, lookup_service};

    fn make_booking(service: &str) -> Booking {
        let entry = lookup_service(service).unwrap();
        Booking::new(
            Uuid::new_v4(),
            entry,
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_profit_empty() {
        assert_eq!(total_admin_profit(&[]), 0);
    }

    #[test]
    fn test_profit_counts_only_completed() {
        let mut wiring = make_booking("Wiring Work"); // 500
        let mut fan = make_booking("Fan Installation"); // 300
        let office = make_booking("Office Cleaning"); // 1000, stays pending
        let mut tap = make_booking("Tap Repair"); // 300, in progress
        tap.status = BookingStatus::InProgress;

        wiring.complete(CommissionRate::DEFAULT);
        fan.complete(CommissionRate::DEFAULT);

        let bookings = vec![wiring, fan, office, tap];
        assert_eq!(total_admin_profit(&bookings), 8000);
    }

    #[test]
    fn test_provider_earnings() {
        let provider = Uuid::new_v4();
        let mut first = make_booking("Wiring Work");
        let mut second = make_booking("Light Repair");
        let mut unassigned = make_booking("Socket Repair");
        first.provider_id = Some(provider);
        second.provider_id = Some(provider);
        first.complete(CommissionRate::DEFAULT);
        second.complete(CommissionRate::DEFAULT);
        unassigned.complete(CommissionRate::DEFAULT);

        let earnings = provider_earnings(&[first, second, unassigned]);
        assert_eq!(earnings.len(), 1);
        assert_eq!(earnings.get(&provider), Some(&(45000 + 18000)));
    }

    #[test]
    fn test_settlement_violations() {
        let mut settled = make_booking("Custom Furniture");
        settled.complete(CommissionRate::DEFAULT);
        let pending = make_booking("Home Cleaning");
        assert!(settlement_violations(&[settled.clone(), pending.clone()]).is_empty());

        let mut tampered = settled.clone();
        tampered.payout_cents += 1;
        let mut premature = pending.clone();
        premature.commission_cents = 100;

        let bookings = [settled, tampered, pending, premature];
        let bad = settlement_violations(&bookings);
        assert_eq!(bad.len(), 2);
    }
}
