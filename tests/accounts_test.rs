mod common;

use anyhow::Result;
use common::{Accounts, test_service, test_service_with};
use servicehub::application::{Actor, AppError, LedgerConfig};
use servicehub::domain::ServiceCategory;

#[tokio::test]
async fn test_register_and_login_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let user = service
        .register_user(
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "s3cret".to_string(),
            "9876543210".to_string(),
            "12 MG Road".to_string(),
        )
        .await?;
    assert_eq!(user.email, "asha@example.com");

    let ctx = service.login_user("asha@example.com", "s3cret").await?;
    assert_eq!(ctx.actor(), Some(Actor::User(user.id)));

    // Email lookup ignores case and surrounding whitespace
    let ctx = service.login_user("  ASHA@example.com ", "s3cret").await?;
    assert_eq!(ctx.actor(), Some(Actor::User(user.id)));

    let stored = service.get_user(user.id).await?;
    assert_eq!(stored.name, "Asha Rao");
    assert_eq!(stored.address, "12 MG Road");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_user_email_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    Accounts::user(&service, "dup@example.com").await?;

    let result = service
        .register_user(
            "Someone Else".to_string(),
            "Dup@Example.com".to_string(),
            "other".to_string(),
            "1111111111".to_string(),
            "Elsewhere".to_string(),
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::DuplicateEmail { role: "user", .. })
    ));

    // A novel email still succeeds
    Accounts::user(&service, "fresh@example.com").await?;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_provider_email_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    Accounts::provider(&service, "pro@example.com", "Plumber").await?;

    let result = service
        .register_provider(
            "Another".to_string(),
            "Electrician",
            "pro@example.com".to_string(),
            "pw".to_string(),
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::DuplicateEmail {
            role: "provider",
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_user_and_provider_emails_are_independent() -> Result<()> {
    let (service, _temp) = test_service().await?;

    Accounts::user(&service, "same@example.com").await?;
    let (provider, _) = Accounts::provider(&service, "same@example.com", "Cleaning").await?;
    assert_eq!(provider.category, ServiceCategory::Cleaning);

    Ok(())
}

#[tokio::test]
async fn test_registration_requires_all_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .register_user(
            "No Address".to_string(),
            "na@example.com".to_string(),
            "pw".to_string(),
            "9876543210".to_string(),
            "   ".to_string(),
        )
        .await;
    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("address")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let result = service
        .register_provider(
            "".to_string(),
            "Plumber",
            "np@example.com".to_string(),
            "pw".to_string(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_provider_unknown_service_type_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .register_provider(
            "Gita".to_string(),
            "Gardener",
            "gita@example.com".to_string(),
            "pw".to_string(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Category names are case-insensitive
    let provider = service
        .register_provider(
            "Gita".to_string(),
            "ac",
            "gita@example.com".to_string(),
            "pw".to_string(),
        )
        .await?;
    assert_eq!(provider.category, ServiceCategory::Ac);

    Ok(())
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() -> Result<()> {
    let (service, _temp) = test_service().await?;
    Accounts::user(&service, "u@example.com").await?;
    Accounts::provider(&service, "p@example.com", "Carpenter").await?;

    assert!(matches!(
        service.login_user("u@example.com", "wrong").await,
        Err(AppError::InvalidCredentials)
    ));
    assert!(matches!(
        service.login_user("nobody@example.com", "password").await,
        Err(AppError::InvalidCredentials)
    ));
    // A user account cannot be used to log in as a provider
    assert!(matches!(
        service.login_provider("u@example.com", "password").await,
        Err(AppError::InvalidCredentials)
    ));

    let ctx = service.login_provider("p@example.com", "password").await?;
    let Some(Actor::Provider(id)) = ctx.actor() else {
        panic!("expected a provider context, got {:?}", ctx.actor());
    };
    assert_eq!(
        service.get_provider(id).await?.category,
        ServiceCategory::Carpenter
    );

    Ok(())
}

#[tokio::test]
async fn test_passwords_are_stored_hashed() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (user, _) = Accounts::user(&service, "asha@example.com").await?;
    let (provider, _) = Accounts::provider(&service, "ravi@example.com", "Plumber").await?;

    let stored_user = service.get_user(user.id).await?;
    assert_ne!(stored_user.password_hash, "password");
    assert!(stored_user.password_hash.starts_with("$argon2id$"));

    let stored_provider = service.get_provider(provider.id).await?;
    assert_ne!(stored_provider.password_hash, "password");
    assert!(stored_provider.password_hash.starts_with("$argon2id$"));

    // Each account gets its own salt
    assert_ne!(stored_user.password_hash, stored_provider.password_hash);

    // Login still works against the hash
    let ctx = service.login_user("asha@example.com", "password").await?;
    assert_eq!(ctx.actor(), Some(Actor::User(user.id)));
    let ctx = service.login_provider("ravi@example.com", "password").await?;
    assert_eq!(ctx.actor(), Some(Actor::Provider(provider.id)));

    // The stored hash is not itself a password
    assert!(matches!(
        service
            .login_user("asha@example.com", &stored_user.password_hash)
            .await,
        Err(AppError::InvalidCredentials)
    ));

    Ok(())
}

#[tokio::test]
async fn test_admin_login_uses_configured_credentials() -> Result<()> {
    let (service, _temp) = test_service().await?;
    assert_eq!(
        service.login_admin("admin", "admin")?.actor(),
        Some(Actor::Admin)
    );
    assert!(matches!(
        service.login_admin("admin", "nope"),
        Err(AppError::InvalidCredentials)
    ));

    let config = LedgerConfig::default().with_admin("root", "hunter2");
    let (service, _temp) = test_service_with(config).await?;
    assert!(service.login_admin("admin", "admin").is_err());
    assert_eq!(
        service.login_admin("root", "hunter2")?.actor(),
        Some(Actor::Admin)
    );

    Ok(())
}
