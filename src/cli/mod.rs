use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::application::{LedgerConfig, MarketplaceService, RequestContext};
use crate::domain::{BookingStatus, CommissionRate, ServiceCategory, format_cents};
use crate::storage::BookingDetails;

/// ServiceHub - home services marketplace
#[derive(Parser)]
#[command(name = "servicehub")]
#[command(about = "Book home services, settle jobs and track the marketplace commission")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SERVICEHUB_DB", default_value = "servicehub.db")]
    pub database: String,

    /// Admin's share of each completed booking (e.g. "0.10")
    #[arg(long, env = "SERVICEHUB_COMMISSION_RATE", default_value = "0.10")]
    pub commission_rate: CommissionRate,

    /// Username accepted by the admin login
    #[arg(long, env = "SERVICEHUB_ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Password accepted by the admin login
    #[arg(
        long,
        env = "SERVICEHUB_ADMIN_PASSWORD",
        default_value = "admin",
        hide_env_values = true
    )]
    pub admin_password: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// List bookable services and their prices
    Catalog {
        /// Only show one category: electrician, plumber, ac, carpenter, cleaning
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Customer commands
    #[command(subcommand)]
    User(UserCommands),

    /// Service provider commands
    #[command(subcommand)]
    Provider(ProviderCommands),

    /// Marketplace administration
    #[command(subcommand)]
    Admin(AdminCommands),
}

/// Email and password identifying a user or provider
#[derive(Args)]
pub struct Login {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "SERVICEHUB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Admin username and password
#[derive(Args)]
pub struct AdminLogin {
    /// Admin username
    #[arg(long, default_value = "admin")]
    pub username: String,

    /// Admin password
    #[arg(long, env = "SERVICEHUB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new customer account
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email (must be unique)
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Mobile number
        #[arg(long)]
        mobile: String,

        /// Service address
        #[arg(long)]
        address: String,
    },

    /// Book a service
    Book {
        #[command(flatten)]
        login: Login,

        /// Service name as listed in the catalog (e.g. "Wiring Work")
        service: String,

        /// Requested date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List my bookings
    Bookings {
        #[command(flatten)]
        login: Login,
    },
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// Register a new provider account
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Service type: electrician, plumber, ac, carpenter, cleaning
        #[arg(short = 't', long = "service-type")]
        service_type: String,

        /// Email (must be unique)
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// Show bookings in my category and where to pay commission
    Dashboard {
        #[command(flatten)]
        login: Login,
    },

    /// Take a booking and set its status (pending, in_progress)
    Status {
        #[command(flatten)]
        login: Login,

        /// Booking ID
        id: String,

        /// New status
        status: String,
    },

    /// Complete a booking and settle commission and payout
    Complete {
        #[command(flatten)]
        login: Login,

        /// Booking ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Users, providers, bookings and total profit
    Dashboard {
        #[command(flatten)]
        login: AdminLogin,
    },

    /// Total commission earned on completed bookings
    Profit {
        #[command(flatten)]
        login: AdminLogin,
    },

    /// Set the admin payout destination
    SetPayment {
        #[command(flatten)]
        login: AdminLogin,

        /// UPI id
        #[arg(long)]
        upi_id: String,

        /// Bank name
        #[arg(long)]
        bank_name: String,

        /// Account number
        #[arg(long)]
        account_number: String,

        /// IFSC code
        #[arg(long)]
        ifsc: String,
    },

    /// Show the admin payout destination
    Payment {
        #[command(flatten)]
        login: AdminLogin,
    },

    /// Verify that every booking respects the settlement rules
    Check {
        #[command(flatten)]
        login: AdminLogin,
    },

    /// Export bookings to CSV or the whole marketplace to JSON
    Export {
        #[command(flatten)]
        login: AdminLogin,

        /// Format: csv (bookings) or json (full snapshot)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_commission_rate(self.commission_rate)
            .with_admin(self.admin_user.clone(), self.admin_password.clone())
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();

        match self.command {
            Commands::Init => {
                MarketplaceService::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Catalog { category } => {
                let service = MarketplaceService::connect(&self.database, config).await?;
                run_catalog_command(&service, category.as_deref())?;
            }

            Commands::User(cmd) => {
                let service = MarketplaceService::connect(&self.database, config).await?;
                run_user_command(&service, cmd).await?;
            }

            Commands::Provider(cmd) => {
                let service = MarketplaceService::connect(&self.database, config).await?;
                run_provider_command(&service, cmd).await?;
            }

            Commands::Admin(cmd) => {
                let service = MarketplaceService::connect(&self.database, config).await?;
                run_admin_command(&service, cmd).await?;
            }
        }

        Ok(())
    }
}

fn run_catalog_command(service: &MarketplaceService, category: Option<&str>) -> Result<()> {
    let category = category
        .map(|c| {
            ServiceCategory::from_str(c).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid category '{}'. Valid categories: electrician, plumber, ac, carpenter, cleaning",
                    c
                )
            })
        })
        .transpose()?;

    println!("{:<28} {:<12} {:>10}", "SERVICE", "CATEGORY", "PRICE");
    println!("{}", "-".repeat(52));
    for entry in service.catalog(category) {
        println!(
            "{:<28} {:<12} {:>10}",
            entry.name,
            entry.category,
            format_cents(entry.price_cents)
        );
    }
    Ok(())
}

async fn run_user_command(service: &MarketplaceService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Register {
            name,
            email,
            password,
            mobile,
            address,
        } => {
            let user = service
                .register_user(name, email, password, mobile, address)
                .await?;
            println!("Registered user: {} <{}>", user.name, user.email);
        }

        UserCommands::Book {
            login,
            service: service_name,
            date,
        } => {
            let ctx = service.login_user(&login.email, &login.password).await?;
            let booking_date = match date {
                Some(date_str) => parse_date(&date_str).with_context(|| {
                    format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                })?,
                None => Local::now().date_naive(),
            };

            let booking = service
                .create_booking(&ctx, &service_name, booking_date)
                .await?;
            println!(
                "Booked {} for {} at {} ({})",
                booking.service_name,
                booking.booking_date,
                format_cents(booking.price_cents),
                booking.id
            );
        }

        UserCommands::Bookings { login } => {
            let ctx = service.login_user(&login.email, &login.password).await?;
            let bookings = service.my_bookings(&ctx).await?;
            if bookings.is_empty() {
                println!("No bookings found.");
            } else {
                println!(
                    "{:<24} {:>10} {:<12} {:<12} PROVIDER",
                    "SERVICE", "PRICE", "DATE", "STATUS"
                );
                println!("{}", "-".repeat(76));
                for details in bookings {
                    let booking = &details.booking;
                    println!(
                        "{:<24} {:>10} {:<12} {:<12} {}",
                        truncate(&booking.service_name, 24),
                        format_cents(booking.price_cents),
                        booking.booking_date,
                        booking.status,
                        details.provider_name.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_provider_command(service: &MarketplaceService, cmd: ProviderCommands) -> Result<()> {
    match cmd {
        ProviderCommands::Register {
            name,
            service_type,
            email,
            password,
        } => {
            let provider = service
                .register_provider(name, &service_type, email, password)
                .await?;
            println!(
                "Registered provider: {} <{}> ({})",
                provider.name, provider.email, provider.category
            );
        }

        ProviderCommands::Dashboard { login } => {
            let ctx = service.login_provider(&login.email, &login.password).await?;
            let dashboard = service.provider_dashboard(&ctx).await?;

            println!(
                "Provider: {} ({})",
                dashboard.provider.name, dashboard.provider.category
            );
            println!("Earned:   {}", format_cents(dashboard.earned_cents));
            println!();
            print_provider_bookings(&dashboard.bookings);

            println!();
            match dashboard.admin_payment {
                Some(payment) => {
                    println!("Pay commission to:");
                    println!("  UPI:     {}", payment.upi_id);
                    println!("  Bank:    {}", payment.bank_name);
                    println!("  Account: {}", payment.account_number);
                    println!("  IFSC:    {}", payment.ifsc);
                }
                None => println!("Admin payment details are not set yet."),
            }
        }

        ProviderCommands::Status { login, id, status } => {
            let ctx = service.login_provider(&login.email, &login.password).await?;
            let booking_id = parse_booking_id(&id)?;
            let status = BookingStatus::from_str(&status).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid status '{}'. Valid statuses: pending, in_progress",
                    status
                )
            })?;

            let booking = service.assign_status(&ctx, booking_id, status).await?;
            println!("Booking {} is now {}", booking.id, booking.status);
        }

        ProviderCommands::Complete { login, id } => {
            let ctx = service.login_provider(&login.email, &login.password).await?;
            let booking_id = parse_booking_id(&id)?;

            let result = service.complete_booking(&ctx, booking_id).await?;
            if !result.settled_now {
                println!("Booking {} was already completed.", result.booking.id);
            } else {
                println!("Completed booking {}", result.booking.id);
            }
            println!(
                "  Price:      {}",
                format_cents(result.booking.price_cents)
            );
            println!(
                "  Commission: {}",
                format_cents(result.settlement.commission_cents)
            );
            println!(
                "  Payout:     {}",
                format_cents(result.settlement.payout_cents)
            );
        }
    }
    Ok(())
}

async fn run_admin_command(service: &MarketplaceService, cmd: AdminCommands) -> Result<()> {
    match cmd {
        AdminCommands::Dashboard { login } => {
            let ctx = admin_login(service, &login)?;
            let dashboard = service.admin_dashboard(&ctx).await?;

            println!("Users ({}):", dashboard.users.len());
            for user in &dashboard.users {
                println!("  {:<20} {:<28} {}", user.name, user.email, user.mobile);
            }
            println!();
            println!("Providers ({}):", dashboard.providers.len());
            for provider in &dashboard.providers {
                println!(
                    "  {:<20} {:<28} {}",
                    provider.name, provider.email, provider.category
                );
            }
            println!();
            println!(
                "{:<36} {:<16} {:<24} {:>10} {:<12} {:>10} PROVIDER",
                "ID", "USER", "SERVICE", "PRICE", "STATUS", "COMMISSION"
            );
            println!("{}", "-".repeat(130));
            for details in &dashboard.bookings {
                let booking = &details.booking;
                println!(
                    "{:<36} {:<16} {:<24} {:>10} {:<12} {:>10} {}",
                    booking.id,
                    truncate(details.user_name.as_deref().unwrap_or("?"), 16),
                    truncate(&booking.service_name, 24),
                    format_cents(booking.price_cents),
                    booking.status,
                    format_cents(booking.commission_cents),
                    details.provider_name.as_deref().unwrap_or("-")
                );
            }
            println!();
            println!("Total profit: {}", format_cents(dashboard.total_profit));
        }

        AdminCommands::Profit { login } => {
            let ctx = admin_login(service, &login)?;
            let profit = service.total_admin_profit(&ctx).await?;
            println!("Total profit: {}", format_cents(profit));
        }

        AdminCommands::SetPayment {
            login,
            upi_id,
            bank_name,
            account_number,
            ifsc,
        } => {
            let ctx = admin_login(service, &login)?;
            let profile = service
                .set_admin_payment(&ctx, upi_id, bank_name, account_number, ifsc)
                .await?;
            println!(
                "Saved payment details: {} / {} ({})",
                profile.upi_id, profile.bank_name, profile.ifsc
            );
        }

        AdminCommands::Payment { login } => {
            let ctx = admin_login(service, &login)?;
            match service.admin_payment(&ctx).await? {
                Some(payment) => {
                    println!("UPI:     {}", payment.upi_id);
                    println!("Bank:    {}", payment.bank_name);
                    println!("Account: {}", payment.account_number);
                    println!("IFSC:    {}", payment.ifsc);
                    println!(
                        "Updated: {}",
                        payment.updated_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                None => println!("No payment details set."),
            }
        }

        AdminCommands::Check { login } => {
            let ctx = admin_login(service, &login)?;
            println!("Checking settlement ledger...\n");
            let check = service.check_ledger(&ctx).await?;

            println!("Bookings:  {}", check.booking_count);
            println!("Completed: {}", check.completed_count);
            println!("Profit:    {}", format_cents(check.total_profit));
            println!();
            if check.is_consistent() {
                println!("✓ All bookings respect the settlement rules");
            } else {
                if check.total_profit != check.recomputed_profit {
                    println!(
                        "✗ Stored profit {} does not match bookings ({})",
                        format_cents(check.total_profit),
                        format_cents(check.recomputed_profit)
                    );
                }
                if !check.violations.is_empty() {
                    println!("✗ {} inconsistent booking(s):", check.violations.len());
                    for id in &check.violations {
                        println!("  {}", id);
                    }
                }
                anyhow::bail!("Ledger check failed");
            }
        }

        AdminCommands::Export {
            login,
            format,
            output,
        } => {
            let ctx = admin_login(service, &login)?;
            run_export_command(service, &ctx, &format, output.as_deref()).await?;
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &MarketplaceService,
    ctx: &RequestContext,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service, ctx);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format.to_lowercase().as_str() {
        "csv" => {
            let count = exporter.export_bookings_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} bookings", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} users, {} providers, {} bookings",
                    snapshot.users.len(),
                    snapshot.providers.len(),
                    snapshot.bookings.len()
                );
            }
        }
        other => anyhow::bail!("Unknown export format '{}'. Use csv or json", other),
    }
    Ok(())
}

fn print_provider_bookings(bookings: &[BookingDetails]) {
    if bookings.is_empty() {
        println!("No bookings in your category.");
        return;
    }

    println!(
        "{:<36} {:<22} {:>9} {:<12} {:<12} {:<16} {:<12} ADDRESS",
        "ID", "SERVICE", "PRICE", "DATE", "STATUS", "CUSTOMER", "MOBILE"
    );
    println!("{}", "-".repeat(140));
    for details in bookings {
        let booking = &details.booking;
        println!(
            "{:<36} {:<22} {:>9} {:<12} {:<12} {:<16} {:<12} {}",
            booking.id,
            truncate(&booking.service_name, 22),
            format_cents(booking.price_cents),
            booking.booking_date,
            booking.status,
            truncate(details.user_name.as_deref().unwrap_or("?"), 16),
            details.user_mobile.as_deref().unwrap_or(""),
            truncate(details.user_address.as_deref().unwrap_or(""), 30)
        );
        if booking.is_completed() {
            println!(
                "{:<36} commission {} / payout {}",
                "",
                format_cents(booking.commission_cents),
                format_cents(booking.payout_cents)
            );
        }
    }
}

fn admin_login(service: &MarketplaceService, login: &AdminLogin) -> Result<RequestContext> {
    Ok(service.login_admin(&login.username, &login.password)?)
}

fn parse_booking_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).context("Invalid booking ID format (expected UUID)")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}
