use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

use crate::domain::{
    AdminPaymentProfile, Booking, BookingId, BookingStatus, CatalogEntry, Cents, Provider,
    ProviderId, SERVICE_CATALOG, ServiceCategory, Settlement, TransitionError, User, UserId,
    hash_password, lookup_service, normalize_email, provider_earnings, services_in_category,
    settlement_violations, total_admin_profit, verify_password,
};
use crate::storage::{BookingDetails, BookingQuery, Repository, is_unique_violation};

use super::{Actor, AppError, LedgerConfig, RequestContext};

/// Application service providing the marketplace's operations.
/// This is the primary interface for any client (CLI, web handlers, etc.).
pub struct MarketplaceService {
    repo: Repository,
    config: LedgerConfig,
}

/// Result of completing a booking
#[derive(Debug)]
pub struct CompletionResult {
    pub booking: Booking,
    pub settlement: Settlement,
    /// False when the booking had already been completed and nothing changed
    pub settled_now: bool,
}

/// Everything a provider sees: open and past jobs in their category, and
/// where to send the admin's commission.
#[derive(Debug)]
pub struct ProviderDashboard {
    pub provider: Provider,
    pub bookings: Vec<BookingDetails>,
    pub admin_payment: Option<AdminPaymentProfile>,
    pub earned_cents: Cents,
}

/// Admin overview of the whole marketplace
#[derive(Debug)]
pub struct AdminDashboard {
    pub users: Vec<User>,
    pub providers: Vec<Provider>,
    pub bookings: Vec<BookingDetails>,
    pub total_profit: Cents,
}

/// Outcome of a settlement consistency check
#[derive(Debug)]
pub struct LedgerCheck {
    pub booking_count: usize,
    pub completed_count: usize,
    pub total_profit: Cents,
    /// Profit summed from the bookings themselves
    pub recomputed_profit: Cents,
    pub violations: Vec<BookingId>,
}

impl LedgerCheck {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty() && self.total_profit == self.recomputed_profit
    }
}

impl MarketplaceService {
    /// Create a new marketplace service with the given repository.
    pub fn new(repo: Repository, config: LedgerConfig) -> Self {
        Self { repo, config }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================
    // Catalog
    // ========================

    /// Bookable services, optionally restricted to one category.
    pub fn catalog(&self, category: Option<ServiceCategory>) -> Vec<&'static CatalogEntry> {
        match category {
            Some(category) => services_in_category(category),
            None => SERVICE_CATALOG.iter().collect(),
        }
    }

    // ========================
    // Accounts
    // ========================

    /// Register a new user. Every field is required and the email must be unused.
    pub async fn register_user(
        &self,
        name: String,
        email: String,
        password: String,
        mobile: String,
        address: String,
    ) -> Result<User, AppError> {
        require_fields(&[
            ("name", name.as_str()),
            ("email", email.as_str()),
            ("password", password.as_str()),
            ("mobile", mobile.as_str()),
            ("address", address.as_str()),
        ])?;

        let email = normalize_email(&email);
        if self.repo.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail { role: "user", email });
        }

        let user = User::new(name, &email, secure_password(&password)?, mobile, address);

        if let Err(e) = self.repo.save_user(&user).await {
            return Err(duplicate_or_database(e, "user", user.email));
        }

        info!("Registered user {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Register a new provider for one service category.
    pub async fn register_provider(
        &self,
        name: String,
        category: &str,
        email: String,
        password: String,
    ) -> Result<Provider, AppError> {
        require_fields(&[
            ("name", name.as_str()),
            ("service type", category),
            ("email", email.as_str()),
            ("password", password.as_str()),
        ])?;

        let category = ServiceCategory::from_str(category).ok_or_else(|| {
            AppError::Validation(format!("Unknown service type: {}", category.trim()))
        })?;

        let email = normalize_email(&email);
        if self.repo.get_provider_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail {
                role: "provider",
                email,
            });
        }

        let provider = Provider::new(name, category, &email, secure_password(&password)?);

        if let Err(e) = self.repo.save_provider(&provider).await {
            return Err(duplicate_or_database(e, "provider", provider.email));
        }

        info!(
            "Registered provider {} ({}) for {}",
            provider.email, provider.id, provider.category
        );
        Ok(provider)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<RequestContext, AppError> {
        match self.repo.get_user_by_email(&normalize_email(email)).await? {
            Some(user) if verify_password(password, &user.password_hash) => {
                Ok(RequestContext::user(user.id))
            }
            _ => {
                warn!("Rejected user login for {}", email.trim());
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub async fn login_provider(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RequestContext, AppError> {
        match self.repo.get_provider_by_email(&normalize_email(email)).await? {
            Some(provider) if verify_password(password, &provider.password_hash) => {
                Ok(RequestContext::provider(provider.id))
            }
            _ => {
                warn!("Rejected provider login for {}", email.trim());
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub fn login_admin(&self, username: &str, password: &str) -> Result<RequestContext, AppError> {
        let admin = &self.config.admin;
        if username == admin.username && password == admin.password {
            Ok(RequestContext::admin())
        } else {
            warn!("Rejected admin login for {}", username);
            Err(AppError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    pub async fn get_provider(&self, id: ProviderId) -> Result<Provider, AppError> {
        self.repo
            .get_provider(id)
            .await?
            .ok_or_else(|| AppError::ProviderNotFound(id.to_string()))
    }

    // ========================
    // Booking ledger
    // ========================

    /// Request a catalog service. The price and category come from the catalog.
    pub async fn create_booking(
        &self,
        ctx: &RequestContext,
        service_name: &str,
        booking_date: NaiveDate,
    ) -> Result<Booking, AppError> {
        let user = self.require_user(ctx).await?;

        let service = lookup_service(service_name.trim()).ok_or_else(|| {
            AppError::Validation(format!("Unknown service: {}", service_name.trim()))
        })?;

        let today = Local::now().date_naive();
        if booking_date < today {
            return Err(AppError::Validation(format!(
                "Booking date {} is in the past",
                booking_date
            )));
        }

        let booking = Booking::new(user.id, service, booking_date);
        self.repo.save_booking(&booking).await?;

        info!(
            "User {} booked {} for {} ({})",
            user.id, booking.service_name, booking.booking_date, booking.id
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, AppError> {
        self.repo
            .get_booking(id)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(id.to_string()))
    }

    /// A provider takes a booking and sets its status. Completion is not
    /// allowed here; it goes through `complete_booking` so the booking is settled.
    pub async fn assign_status(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, AppError> {
        let provider = self.require_provider(ctx).await?;
        let mut booking = self.get_booking(booking_id).await?;

        check_provider_may_act(&provider, &booking)?;
        booking
            .check_assignable(status)
            .map_err(|e| transition_error(booking_id, e))?;

        if !self
            .repo
            .assign_booking(booking_id, provider.id, status)
            .await?
        {
            // Changed between our read and the update
            let current = self.get_booking(booking_id).await?;
            check_provider_may_act(&provider, &current)?;
            current
                .check_assignable(status)
                .map_err(|e| transition_error(booking_id, e))?;
            return Err(concurrent_change(booking_id));
        }

        booking.provider_id = Some(provider.id);
        booking.status = status;
        info!(
            "Provider {} set booking {} to {}",
            provider.id, booking_id, status
        );
        Ok(booking)
    }

    /// Complete a booking and settle commission and payout at the configured rate.
    /// Completing an already completed booking changes nothing and returns the
    /// stored settlement.
    pub async fn complete_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<CompletionResult, AppError> {
        let provider = self.require_provider(ctx).await?;
        let mut booking = self.get_booking(booking_id).await?;

        check_provider_may_act(&provider, &booking)?;

        let Some(settlement) = booking.complete(self.config.commission_rate) else {
            warn!("Booking {} is already completed; keeping its settlement", booking_id);
            return Ok(CompletionResult {
                settlement: booking.settlement(),
                booking,
                settled_now: false,
            });
        };

        if !self
            .repo
            .complete_booking(booking_id, provider.id, settlement)
            .await?
        {
            // Changed between our read and the update: taken by another
            // provider, or already settled
            let stored = self.get_booking(booking_id).await?;
            check_provider_may_act(&provider, &stored)?;
            if !stored.is_completed() {
                return Err(concurrent_change(booking_id));
            }
            warn!("Booking {} was completed concurrently", booking_id);
            return Ok(CompletionResult {
                settlement: stored.settlement(),
                booking: stored,
                settled_now: false,
            });
        }

        booking.provider_id = Some(provider.id);
        info!(
            "Booking {} completed: price {}, commission {}, payout {}",
            booking_id, booking.price_cents, settlement.commission_cents, settlement.payout_cents
        );
        Ok(CompletionResult {
            booking,
            settlement,
            settled_now: true,
        })
    }

    /// Sum of commission over completed bookings.
    pub async fn total_admin_profit(&self, ctx: &RequestContext) -> Result<Cents, AppError> {
        require_admin(ctx)?;
        Ok(self.repo.total_admin_profit().await?)
    }

    // ========================
    // Read models
    // ========================

    /// The acting user's bookings, newest first.
    pub async fn my_bookings(&self, ctx: &RequestContext) -> Result<Vec<BookingDetails>, AppError> {
        let user = self.require_user(ctx).await?;
        let filter = BookingQuery {
            user_id: Some(user.id),
            ..Default::default()
        };
        let bookings = self.repo.list_booking_details(&filter).await?;
        debug!("Loaded {} bookings for user {}", bookings.len(), user.id);
        Ok(bookings)
    }

    pub async fn provider_dashboard(
        &self,
        ctx: &RequestContext,
    ) -> Result<ProviderDashboard, AppError> {
        let provider = self.require_provider(ctx).await?;
        let filter = BookingQuery {
            category: Some(provider.category),
            ..Default::default()
        };
        let bookings = self.repo.list_booking_details(&filter).await?;
        let admin_payment = self.repo.get_admin_payment().await?;

        let plain: Vec<Booking> = bookings.iter().map(|d| d.booking.clone()).collect();
        let earned_cents = provider_earnings(&plain)
            .get(&provider.id)
            .copied()
            .unwrap_or(0);

        debug!(
            "Loaded {} {} bookings for provider {}",
            bookings.len(),
            provider.category,
            provider.id
        );
        Ok(ProviderDashboard {
            provider,
            bookings,
            admin_payment,
            earned_cents,
        })
    }

    pub async fn admin_dashboard(&self, ctx: &RequestContext) -> Result<AdminDashboard, AppError> {
        require_admin(ctx)?;
        Ok(AdminDashboard {
            users: self.repo.list_users().await?,
            providers: self.repo.list_providers().await?,
            bookings: self
                .repo
                .list_booking_details(&BookingQuery::default())
                .await?,
            total_profit: self.repo.total_admin_profit().await?,
        })
    }

    /// All bookings, newest first. Admin only.
    pub async fn list_bookings(&self, ctx: &RequestContext) -> Result<Vec<Booking>, AppError> {
        require_admin(ctx)?;
        Ok(self.repo.list_bookings().await?)
    }

    /// Verify that every booking respects the settlement invariant.
    pub async fn check_ledger(&self, ctx: &RequestContext) -> Result<LedgerCheck, AppError> {
        require_admin(ctx)?;
        let bookings = self.repo.list_bookings().await?;
        let total_profit = self.repo.total_admin_profit().await?;

        let check = LedgerCheck {
            booking_count: bookings.len(),
            completed_count: bookings.iter().filter(|b| b.is_completed()).count(),
            total_profit,
            recomputed_profit: total_admin_profit(&bookings),
            violations: settlement_violations(&bookings)
                .into_iter()
                .map(|b| b.id)
                .collect(),
        };
        if !check.is_consistent() {
            warn!(
                "Ledger check found {} violations (stored profit {}, recomputed {})",
                check.violations.len(),
                check.total_profit,
                check.recomputed_profit
            );
        }
        Ok(check)
    }

    // ========================
    // Admin payment profile
    // ========================

    /// Create or replace the admin's payout destination.
    pub async fn set_admin_payment(
        &self,
        ctx: &RequestContext,
        upi_id: String,
        bank_name: String,
        account_number: String,
        ifsc: String,
    ) -> Result<AdminPaymentProfile, AppError> {
        require_admin(ctx)?;

        let profile = AdminPaymentProfile::new(upi_id, bank_name, account_number, ifsc);
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        self.repo.upsert_admin_payment(&profile).await?;
        info!("Admin payment profile updated");
        Ok(profile)
    }

    /// The admin's payout destination, visible to any signed-in party.
    pub async fn admin_payment(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<AdminPaymentProfile>, AppError> {
        if !ctx.is_authenticated() {
            return Err(AppError::Unauthorized("login required".to_string()));
        }
        Ok(self.repo.get_admin_payment().await?)
    }

    // ========================
    // Actor checks
    // ========================

    async fn require_user(&self, ctx: &RequestContext) -> Result<User, AppError> {
        match ctx.actor() {
            Some(Actor::User(id)) => self.repo.get_user(id).await?.ok_or_else(|| {
                warn!("Request from unknown user {}", id);
                AppError::Unauthorized(format!("unknown user {}", id))
            }),
            other => Err(wrong_actor("user", other)),
        }
    }

    async fn require_provider(&self, ctx: &RequestContext) -> Result<Provider, AppError> {
        match ctx.actor() {
            Some(Actor::Provider(id)) => {
                self.repo.get_provider(id).await?.ok_or_else(|| {
                    warn!("Request from unknown provider {}", id);
                    AppError::Unauthorized(format!("unknown provider {}", id))
                })
            }
            other => Err(wrong_actor("provider", other)),
        }
    }
}

fn require_admin(ctx: &RequestContext) -> Result<(), AppError> {
    match ctx.actor() {
        Some(Actor::Admin) => Ok(()),
        other => Err(wrong_actor("admin", other)),
    }
}

fn wrong_actor(expected: &str, actual: Option<Actor>) -> AppError {
    let reason = match actual {
        Some(actor) => format!("{} login required, signed in as {}", expected, actor.role()),
        None => format!("{} login required", expected),
    };
    warn!("Refused request: {}", reason);
    AppError::Unauthorized(reason)
}

/// A provider may only act on bookings in their category that nobody else has taken.
fn check_provider_may_act(provider: &Provider, booking: &Booking) -> Result<(), AppError> {
    if !provider.can_serve(booking.service_category) {
        return Err(AppError::CategoryMismatch {
            booking_id: booking.id,
            booking_category: booking.service_category,
            provider_category: provider.category,
        });
    }
    if let Some(assigned) = booking.provider_id {
        if assigned != provider.id {
            return Err(AppError::Unauthorized(format!(
                "booking {} is assigned to another provider",
                booking.id
            )));
        }
    }
    Ok(())
}

fn transition_error(booking_id: BookingId, error: TransitionError) -> AppError {
    match error {
        TransitionError::CompletionRequiresSettlement => AppError::Validation(error.to_string()),
        TransitionError::AlreadyCompleted | TransitionError::Backwards { .. } => {
            AppError::InvalidTransition {
                booking_id,
                reason: error.to_string(),
            }
        }
    }
}

fn concurrent_change(booking_id: BookingId) -> AppError {
    AppError::InvalidTransition {
        booking_id,
        reason: "booking changed while it was being updated".to_string(),
    }
}

fn secure_password(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::PasswordHash(e.to_string()))
}

fn require_fields(fields: &[(&str, &str)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "All fields are required, missing: {}",
            missing.join(", ")
        )))
    }
}

fn duplicate_or_database(error: anyhow::Error, role: &'static str, email: String) -> AppError {
    if is_unique_violation(&error) {
        AppError::DuplicateEmail { role, email }
    } else {
        AppError::Database(error)
    }
}
