use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{MarketplaceService, RequestContext};
use crate::domain::{AdminPaymentProfile, Booking, Cents, CommissionRate, Provider, User};

/// Full marketplace snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub commission_rate: CommissionRate,
    pub users: Vec<User>,
    pub providers: Vec<Provider>,
    pub bookings: Vec<Booking>,
    pub admin_payment: Option<AdminPaymentProfile>,
    pub total_profit_cents: Cents,
}

/// Exporter for the booking ledger. Every export requires an admin context.
pub struct Exporter<'a> {
    service: &'a MarketplaceService,
    ctx: &'a RequestContext,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a MarketplaceService, ctx: &'a RequestContext) -> Self {
        Self { service, ctx }
    }

    /// Export bookings to CSV format, newest first
    pub async fn export_bookings_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let dashboard = self.service.admin_dashboard(self.ctx).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "created_at",
            "user",
            "service_category",
            "service_name",
            "booking_date",
            "provider",
            "status",
            "price_cents",
            "commission_cents",
            "payout_cents",
        ])?;

        let mut count = 0;
        for details in &dashboard.bookings {
            let booking = &details.booking;
            csv_writer.write_record([
                booking.id.to_string(),
                booking.created_at.to_rfc3339(),
                details.user_name.clone().unwrap_or_default(),
                booking.service_category.as_str().to_string(),
                booking.service_name.clone(),
                booking.booking_date.to_string(),
                details.provider_name.clone().unwrap_or_default(),
                booking.status.as_str().to_string(),
                booking.price_cents.to_string(),
                booking.commission_cents.to_string(),
                booking.payout_cents.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the whole marketplace as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<MarketplaceSnapshot> {
        let dashboard = self.service.admin_dashboard(self.ctx).await?;
        let admin_payment = self.service.admin_payment(self.ctx).await?;

        let snapshot = MarketplaceSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            commission_rate: self.service.config().commission_rate,
            users: dashboard.users,
            providers: dashboard.providers,
            bookings: dashboard.bookings.into_iter().map(|d| d.booking).collect(),
            admin_payment,
            total_profit_cents: dashboard.total_profit,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
