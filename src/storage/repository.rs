use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    AdminPaymentProfile, Booking, BookingId, BookingStatus, Cents, Provider, ProviderId,
    ServiceCategory, Settlement, User, UserId,
};

use super::MIGRATION_001_INITIAL;

const BOOKING_DATE_FORMAT: &str = "%Y-%m-%d";

/// A booking joined with the names and contact details of the people on it.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub booking: Booking,
    pub user_name: Option<String>,
    pub user_mobile: Option<String>,
    pub user_address: Option<String>,
    pub provider_name: Option<String>,
}

/// Which bookings to load in `list_booking_details`.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub user_id: Option<UserId>,
    pub category: Option<ServiceCategory>,
}

/// True when `err` comes from a UNIQUE constraint rejecting an insert.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

/// Repository for persisting and querying accounts, bookings and the payment profile.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, mobile, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.mobile)
        .bind(&user.address)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, mobile, address, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Look up a user by (already normalized) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, mobile, address, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, name, email, password_hash, mobile, address, created_at FROM users ORDER BY created_at, name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            mobile: row.get("mobile"),
            address: row.get("address"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Provider operations
    // ========================

    pub async fn save_provider(&self, provider: &Provider) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO providers (id, name, category, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(provider.id.to_string())
        .bind(&provider.name)
        .bind(provider.category.as_str())
        .bind(&provider.email)
        .bind(&provider.password_hash)
        .bind(provider.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save provider")?;
        Ok(())
    }

    pub async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>> {
        let row = sqlx::query(
            "SELECT id, name, category, email, password_hash, created_at FROM providers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch provider")?;

        row.as_ref().map(Self::row_to_provider).transpose()
    }

    pub async fn get_provider_by_email(&self, email: &str) -> Result<Option<Provider>> {
        let row = sqlx::query(
            "SELECT id, name, category, email, password_hash, created_at FROM providers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch provider by email")?;

        row.as_ref().map(Self::row_to_provider).transpose()
    }

    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        let rows = sqlx::query(
            "SELECT id, name, category, email, password_hash, created_at FROM providers ORDER BY created_at, name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list providers")?;

        rows.iter().map(Self::row_to_provider).collect()
    }

    fn row_to_provider(row: &sqlx::sqlite::SqliteRow) -> Result<Provider> {
        let id_str: String = row.get("id");
        let category_str: String = row.get("category");
        let created_at_str: String = row.get("created_at");

        Ok(Provider {
            id: Uuid::parse_str(&id_str).context("Invalid provider ID")?,
            name: row.get("name"),
            category: ServiceCategory::from_str(&category_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid service category: {}", category_str))?,
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Booking operations
    // ========================

    pub async fn save_booking(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, service_category, service_name, price_cents, booking_date, provider_id, status, commission_cents, payout_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.user_id.to_string())
        .bind(booking.service_category.as_str())
        .bind(&booking.service_name)
        .bind(booking.price_cents)
        .bind(booking.booking_date.format(BOOKING_DATE_FORMAT).to_string())
        .bind(booking.provider_id.map(|id| id.to_string()))
        .bind(booking.status.as_str())
        .bind(booking.commission_cents)
        .bind(booking.payout_cents)
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save booking")?;
        Ok(())
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, service_category, service_name, price_cents, booking_date, provider_id, status, commission_cents, payout_cents, created_at
            FROM bookings
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch booking")?;

        row.as_ref().map(Self::row_to_booking).transpose()
    }

    /// List all bookings, newest first.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, service_category, service_name, price_cents, booking_date, provider_id, status, commission_cents, payout_cents, created_at
            FROM bookings
            ORDER BY rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bookings")?;

        rows.iter().map(Self::row_to_booking).collect()
    }

    /// List bookings joined with user and provider details, newest first.
    pub async fn list_booking_details(&self, filter: &BookingQuery) -> Result<Vec<BookingDetails>> {
        let mut query = String::from(
            r#"
            SELECT
                b.id, b.user_id, b.service_category, b.service_name, b.price_cents, b.booking_date,
                b.provider_id, b.status, b.commission_cents, b.payout_cents, b.created_at,
                u.name AS user_name, u.mobile AS user_mobile, u.address AS user_address,
                p.name AS provider_name
            FROM bookings b
            LEFT JOIN users u ON b.user_id = u.id
            LEFT JOIN providers p ON b.provider_id = p.id
            WHERE 1=1
            "#,
        );

        let user_id_str = filter.user_id.map(|id| id.to_string());

        if filter.user_id.is_some() {
            query.push_str(" AND b.user_id = ?");
        }
        if filter.category.is_some() {
            query.push_str(" AND b.service_category = ?");
        }
        query.push_str(" ORDER BY b.rowid DESC");

        let mut sql_query = sqlx::query(&query);
        if let Some(ref uid) = user_id_str {
            sql_query = sql_query.bind(uid);
        }
        if let Some(category) = filter.category {
            sql_query = sql_query.bind(category.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list booking details")?;

        rows.iter()
            .map(|row| {
                Ok(BookingDetails {
                    booking: Self::row_to_booking(row)?,
                    user_name: row.get("user_name"),
                    user_mobile: row.get("user_mobile"),
                    user_address: row.get("user_address"),
                    provider_name: row.get("provider_name"),
                })
            })
            .collect()
    }

    /// Set provider and status on a booking that is not completed, not taken
    /// by another provider, and not moving back to pending. Returns false when
    /// the guard rejects the update or the booking does not exist.
    pub async fn assign_booking(
        &self,
        id: BookingId,
        provider_id: ProviderId,
        status: BookingStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, provider_id = ?
            WHERE id = ?
              AND status <> 'completed'
              AND (provider_id IS NULL OR provider_id = ?)
              AND (? <> 'pending' OR status = 'pending')
            "#,
        )
        .bind(status.as_str())
        .bind(provider_id.to_string())
        .bind(id.to_string())
        .bind(provider_id.to_string())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to assign booking")?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark a booking completed and record its settlement in one statement.
    /// Returns false when the booking is missing, already completed, or taken
    /// by another provider, in which case nothing is written.
    pub async fn complete_booking(
        &self,
        id: BookingId,
        provider_id: ProviderId,
        settlement: Settlement,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'completed',
                commission_cents = ?,
                payout_cents = ?,
                provider_id = ?
            WHERE id = ?
              AND status <> 'completed'
              AND (provider_id IS NULL OR provider_id = ?)
            "#,
        )
        .bind(settlement.commission_cents)
        .bind(settlement.payout_cents)
        .bind(provider_id.to_string())
        .bind(id.to_string())
        .bind(provider_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to complete booking")?;

        Ok(result.rows_affected() == 1)
    }

    /// Sum of commission over completed bookings, using SQL aggregation.
    pub async fn total_admin_profit(&self) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(commission_cents), 0) AS profit
            FROM bookings
            WHERE status = 'completed'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute admin profit")?;

        Ok(row.get("profit"))
    }

    fn row_to_booking(row: &sqlx::sqlite::SqliteRow) -> Result<Booking> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let category_str: String = row.get("service_category");
        let booking_date_str: String = row.get("booking_date");
        let provider_id_str: Option<String> = row.get("provider_id");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Booking {
            id: Uuid::parse_str(&id_str).context("Invalid booking ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            service_category: ServiceCategory::from_str(&category_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid service category: {}", category_str))?,
            service_name: row.get("service_name"),
            price_cents: row.get("price_cents"),
            booking_date: NaiveDate::parse_from_str(&booking_date_str, BOOKING_DATE_FORMAT)
                .context("Invalid booking date")?,
            provider_id: provider_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid provider ID")?,
            status: BookingStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid booking status: {}", status_str))?,
            commission_cents: row.get("commission_cents"),
            payout_cents: row.get("payout_cents"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Admin payment profile
    // ========================

    pub async fn get_admin_payment(&self) -> Result<Option<AdminPaymentProfile>> {
        let row = sqlx::query(
            "SELECT upi_id, bank_name, account_number, ifsc, updated_at FROM admin_payment WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch admin payment profile")?;

        match row {
            Some(row) => {
                let updated_at_str: String = row.get("updated_at");
                Ok(Some(AdminPaymentProfile {
                    upi_id: row.get("upi_id"),
                    bank_name: row.get("bank_name"),
                    account_number: row.get("account_number"),
                    ifsc: row.get("ifsc"),
                    updated_at: parse_timestamp(&updated_at_str)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Insert the payment profile, or replace the existing one.
    pub async fn upsert_admin_payment(&self, profile: &AdminPaymentProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_payment (id, upi_id, bank_name, account_number, ifsc, updated_at)
            VALUES (1, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                upi_id = excluded.upi_id,
                bank_name = excluded.bank_name,
                account_number = excluded.account_number,
                ifsc = excluded.ifsc,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.upi_id)
        .bind(&profile.bank_name)
        .bind(&profile.account_number)
        .bind(&profile.ifsc)
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save admin payment profile")?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}
