mod common;

use anyhow::Result;
use common::{Accounts, days_from_now, test_service, test_service_with};
use servicehub::application::{AppError, LedgerConfig, RequestContext};
use servicehub::domain::{BookingStatus, CommissionRate, SERVICE_CATALOG};
use uuid::Uuid;

#[tokio::test]
async fn test_complete_wiring_work() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (provider, provider_ctx) =
        Accounts::provider(&service, "volt@example.com", "Electrician").await?;

    let booking = service
        .create_booking(&user_ctx, "Wiring Work", days_from_now(1))
        .await?;
    service
        .assign_status(&provider_ctx, booking.id, BookingStatus::InProgress)
        .await?;

    let result = service.complete_booking(&provider_ctx, booking.id).await?;
    assert!(result.settled_now);
    assert_eq!(result.settlement.commission_cents, 5000);
    assert_eq!(result.settlement.payout_cents, 45000);

    let stored = service.get_booking(booking.id).await?;
    assert_eq!(stored.status, BookingStatus::Completed);
    assert_eq!(stored.commission_cents, 5000);
    assert_eq!(stored.payout_cents, 45000);
    assert_eq!(stored.provider_id, Some(provider.id));

    Ok(())
}

#[tokio::test]
async fn test_complete_pending_booking_assigns_provider() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (provider, provider_ctx) =
        Accounts::provider(&service, "clean@example.com", "Cleaning").await?;

    let booking = service
        .create_booking(&user_ctx, "Bathroom Cleaning", days_from_now(1))
        .await?;

    let result = service.complete_booking(&provider_ctx, booking.id).await?;
    assert_eq!(result.booking.provider_id, Some(provider.id));

    let stored = service.get_booking(booking.id).await?;
    assert_eq!(stored.provider_id, Some(provider.id));
    assert_eq!(stored.commission_cents, 7000);
    assert_eq!(stored.payout_cents, 63000);

    Ok(())
}

#[tokio::test]
async fn test_completion_is_idempotent() -> Result<()> {
    let (service, temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (_, provider_ctx) = Accounts::provider(&service, "wood@example.com", "Carpenter").await?;

    let booking = service
        .create_booking(&user_ctx, "Furniture Repair", days_from_now(1))
        .await?;

    let first = service.complete_booking(&provider_ctx, booking.id).await?;
    assert!(first.settled_now);

    let second = service.complete_booking(&provider_ctx, booking.id).await?;
    assert!(!second.settled_now);
    assert_eq!(second.settlement, first.settlement);

    // Even with a different rate configured, settled amounts stay put
    let db_path = temp.path().join("test.db");
    let rate = CommissionRate::parse("0.25")?;
    let other = servicehub::application::MarketplaceService::connect(
        db_path.to_str().unwrap(),
        LedgerConfig::default().with_commission_rate(rate),
    )
    .await?;
    let provider_again = other.login_provider("wood@example.com", "password").await?;
    let third = other.complete_booking(&provider_again, booking.id).await?;
    assert!(!third.settled_now);

    let stored = service.get_booking(booking.id).await?;
    assert_eq!(stored.commission_cents, 8000);
    assert_eq!(stored.payout_cents, 72000);
    assert_eq!(stored.settlement(), first.settlement);

    Ok(())
}

#[tokio::test]
async fn test_completed_booking_cannot_change_status() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (_, provider_ctx) = Accounts::provider(&service, "ac@example.com", "AC").await?;

    let booking = service
        .create_booking(&user_ctx, "AC General Service", days_from_now(1))
        .await?;
    service.complete_booking(&provider_ctx, booking.id).await?;

    for status in [BookingStatus::Pending, BookingStatus::InProgress] {
        let result = service
            .assign_status(&provider_ctx, booking.id, status)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    }

    let stored = service.get_booking(booking.id).await?;
    assert_eq!(stored.status, BookingStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn test_complete_unknown_booking() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, provider_ctx) = Accounts::provider(&service, "pro@example.com", "Plumber").await?;

    let result = service.complete_booking(&provider_ctx, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::BookingNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_complete_requires_the_right_provider() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (_, plumber) = Accounts::provider(&service, "plumb@example.com", "Plumber").await?;
    let (_, other_plumber) = Accounts::provider(&service, "plumb2@example.com", "Plumber").await?;
    let (_, cleaner) = Accounts::provider(&service, "clean@example.com", "Cleaning").await?;

    let booking = service
        .create_booking(&user_ctx, "Tap Repair", days_from_now(1))
        .await?;

    let result = service.complete_booking(&cleaner, booking.id).await;
    assert!(matches!(result, Err(AppError::CategoryMismatch { .. })));

    service
        .assign_status(&plumber, booking.id, BookingStatus::InProgress)
        .await?;
    let result = service.complete_booking(&other_plumber, booking.id).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));

    let result = service.complete_booking(&user_ctx, booking.id).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(result.unwrap_err().is_authorization());

    // Nothing was settled by the refused attempts
    let stored = service.get_booking(booking.id).await?;
    assert_eq!(stored.status, BookingStatus::InProgress);
    assert_eq!(stored.commission_cents, 0);

    Ok(())
}

#[tokio::test]
async fn test_total_admin_profit() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let admin = Accounts::admin(&service)?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (_, electrician) = Accounts::provider(&service, "volt@example.com", "Electrician").await?;
    let (_, cleaner) = Accounts::provider(&service, "clean@example.com", "Cleaning").await?;

    assert_eq!(service.total_admin_profit(&admin).await?, 0);

    let wiring = service
        .create_booking(&user_ctx, "Wiring Work", days_from_now(1))
        .await?; // 500
    let fan = service
        .create_booking(&user_ctx, "Fan Installation", days_from_now(1))
        .await?; // 300
    service
        .create_booking(&user_ctx, "Office Cleaning", days_from_now(1))
        .await?; // 1000, stays pending
    let light = service
        .create_booking(&user_ctx, "Light Repair", days_from_now(1))
        .await?; // 200, in progress only

    service.complete_booking(&electrician, wiring.id).await?;
    service.complete_booking(&electrician, fan.id).await?;
    service
        .assign_status(&electrician, light.id, BookingStatus::InProgress)
        .await?;

    assert_eq!(service.total_admin_profit(&admin).await?, 8000);

    // Re-completing does not double count
    service.complete_booking(&electrician, wiring.id).await?;
    assert_eq!(service.total_admin_profit(&admin).await?, 8000);

    // Other providers cannot touch these bookings
    assert!(service.complete_booking(&cleaner, light.id).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_profit_is_admin_only() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;

    assert!(matches!(
        service.total_admin_profit(&user_ctx).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        service.total_admin_profit(&RequestContext::anonymous()).await,
        Err(AppError::Unauthorized(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_configured_commission_rate() -> Result<()> {
    let rate = CommissionRate::parse("0.15")?;
    let (service, _temp) =
        test_service_with(LedgerConfig::default().with_commission_rate(rate)).await?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;
    let (_, provider_ctx) = Accounts::provider(&service, "pro@example.com", "Electrician").await?;

    let booking = service
        .create_booking(&user_ctx, "Socket Repair", days_from_now(1))
        .await?; // 180.00

    let result = service.complete_booking(&provider_ctx, booking.id).await?;
    assert_eq!(result.settlement.commission_cents, 2700);
    assert_eq!(result.settlement.payout_cents, 15300);

    Ok(())
}

#[tokio::test]
async fn test_every_catalog_service_settles_exactly() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let admin = Accounts::admin(&service)?;
    let (_, user_ctx) = Accounts::user(&service, "asha@example.com").await?;

    let mut expected_profit = 0;
    for (i, entry) in SERVICE_CATALOG.iter().enumerate() {
        let email = format!("pro{}@example.com", i);
        let (_, provider_ctx) =
            Accounts::provider(&service, &email, entry.category.as_str()).await?;

        let booking = service
            .create_booking(&user_ctx, entry.name, days_from_now(1))
            .await?;
        let result = service.complete_booking(&provider_ctx, booking.id).await?;

        let settlement = result.settlement;
        assert_eq!(settlement.total(), entry.price_cents, "{}", entry.name);
        assert_eq!(
            settlement.commission_cents,
            entry.price_cents / 10,
            "{}",
            entry.name
        );
        expected_profit += settlement.commission_cents;
    }

    assert_eq!(service.total_admin_profit(&admin).await?, expected_profit);

    let check = service.check_ledger(&admin).await?;
    assert!(check.is_consistent());
    assert_eq!(check.booking_count, SERVICE_CATALOG.len());
    assert_eq!(check.completed_count, SERVICE_CATALOG.len());
    assert_eq!(check.total_profit, expected_profit);
    assert_eq!(check.recomputed_profit, expected_profit);

    Ok(())
}
