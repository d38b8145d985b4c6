use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{InviteSource, SheetSync};
use crate::domain::services::booking_service::BookingService;
use crate::domain::services::invite_registry::InviteRegistry;
use crate::domain::services::reconciliation::ReconciliationService;
use crate::infra::clock::SystemClock;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::gateway::http_gateway::HttpPaymentGateway;
use crate::infra::sheets::http_sheet_service::HttpSheetService;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_webhook_repo::PostgresWebhookRepo,
    postgres_job_repo::PostgresJobRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_webhook_repo::SqliteWebhookRepo,
    sqlite_job_repo::SqliteJobRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let sheet_service = Arc::new(HttpSheetService::new(
        config.sheet_service_url.clone(),
        config.sheet_service_token.clone(),
    ));
    let invite_source: Arc<dyn InviteSource> = sheet_service.clone();
    let sheet_sync: Arc<dyn SheetSync> = sheet_service;

    let gateway = Arc::new(HttpPaymentGateway::new(
        config.gateway_base_url.clone(),
        config.gateway_app_id.clone(),
        config.gateway_secret_key.clone(),
        config.frontend_url.clone(),
    ));

    let clock = Arc::new(SystemClock);

    let invite_registry = Arc::new(InviteRegistry::new(
        invite_source,
        clock.clone(),
        config.invite_fallback_codes.clone(),
    ));

    let mut tera = Tera::default();
    tera.add_raw_template("ticket_confirmation.html", include_str!("../templates/ticket_confirmation.html"))
        .expect("Failed to load ticket confirmation template");
    tera.add_raw_template("payment_failed.html", include_str!("../templates/payment_failed.html"))
        .expect("Failed to load payment failed template");
    let templates = Arc::new(tera);

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let booking_repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
        let webhook_repo = Arc::new(PostgresWebhookRepo::new(pool.clone()));
        let job_repo = Arc::new(PostgresJobRepo::new(pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            invite_registry.clone(),
            gateway.clone(),
            clock.clone(),
        ));
        let reconciliation = Arc::new(ReconciliationService::new(
            booking_repo.clone(),
            webhook_repo.clone(),
            gateway.clone(),
            clock.clone(),
            config.gateway_secret_key.clone(),
        ));

        AppState {
            config: config.clone(),
            booking_repo,
            webhook_repo,
            job_repo,
            email_service,
            sheet_service: sheet_sync,
            invite_registry,
            booking_service,
            reconciliation,
            clock,
            templates,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let webhook_repo = Arc::new(SqliteWebhookRepo::new(pool.clone()));
        let job_repo = Arc::new(SqliteJobRepo::new(pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            invite_registry.clone(),
            gateway.clone(),
            clock.clone(),
        ));
        let reconciliation = Arc::new(ReconciliationService::new(
            booking_repo.clone(),
            webhook_repo.clone(),
            gateway.clone(),
            clock.clone(),
            config.gateway_secret_key.clone(),
        ));

        AppState {
            config: config.clone(),
            booking_repo,
            webhook_repo,
            job_repo,
            email_service,
            sheet_service: sheet_sync,
            invite_registry,
            booking_service,
            reconciliation,
            clock,
            templates,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
