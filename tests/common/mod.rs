// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{Days, Local, NaiveDate};
use servicehub::application::{LedgerConfig, MarketplaceService, RequestContext};
use servicehub::domain::{Provider, User};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(MarketplaceService, TempDir)> {
    test_service_with(LedgerConfig::default()).await
}

/// Helper to create a test service with custom configuration
pub async fn test_service_with(config: LedgerConfig) -> Result<(MarketplaceService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = MarketplaceService::init(db_path.to_str().unwrap(), config).await?;
    Ok((service, temp_dir))
}

/// A date `days` from today, always valid for booking
pub fn days_from_now(days: u64) -> NaiveDate {
    Local::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap()
}

/// Test fixture: accounts and their logged-in contexts
pub struct Accounts;

impl Accounts {
    /// Register a user and log them in
    pub async fn user(service: &MarketplaceService, email: &str) -> Result<(User, RequestContext)> {
        let user = service
            .register_user(
                format!("User {}", email),
                email.to_string(),
                "password".to_string(),
                "9876543210".to_string(),
                "42 Residency Road".to_string(),
            )
            .await?;
        let ctx = service.login_user(email, "password").await?;
        Ok((user, ctx))
    }

    /// Register a provider for `category` and log them in
    pub async fn provider(
        service: &MarketplaceService,
        email: &str,
        category: &str,
    ) -> Result<(Provider, RequestContext)> {
        let provider = service
            .register_provider(
                format!("Provider {}", email),
                category,
                email.to_string(),
                "password".to_string(),
            )
            .await?;
        let ctx = service.login_provider(email, "password").await?;
        Ok((provider, ctx))
    }

    pub fn admin(service: &MarketplaceService) -> Result<RequestContext> {
        Ok(service.login_admin("admin", "admin")?)
    }
}
