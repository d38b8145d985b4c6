use ticketing_backend::{
    api::router::create_router,
    background,
    config::Config,
    domain::models::gateway::{GatewayOrderRequest, GatewayOrderSession, GatewayOrderStatus, GatewayTxStatus},
    domain::ports::{Clock, EmailService, InviteSource, PaymentGateway, SheetSync},
    domain::models::booking::Booking,
    domain::services::booking_service::BookingService,
    domain::services::invite_registry::InviteRegistry,
    domain::services::reconciliation::{compute_signature, ReconciliationService},
    error::AppError,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_job_repo::SqliteJobRepo,
        sqlite_webhook_repo::SqliteWebhookRepo,
    },
    state::AppState,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tera::Tera;
use tower::ServiceExt;
use serde_json::{json, Value};
use uuid::Uuid;

pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
}

pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self { sent: Mutex::new(Vec::new()) }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

pub struct MockSheetService {
    pub rows: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl MockSheetService {
    pub fn new() -> Self {
        Self { rows: Mutex::new(Vec::new()), fail: AtomicBool::new(false) }
    }
}

#[async_trait]
impl SheetSync for MockSheetService {
    async fn upsert_booking_row(&self, booking: &Booking) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("sheet sync down".to_string()));
        }
        self.rows.lock().unwrap().push(booking.invite_code.clone());
        Ok(())
    }
}

pub struct MockInviteSource {
    pub codes: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub fetches: AtomicUsize,
}

impl MockInviteSource {
    pub fn new(codes: Vec<&str>) -> Self {
        Self {
            codes: Mutex::new(codes.into_iter().map(String::from).collect()),
            fail: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InviteSource for MockInviteSource {
    async fn fetch_codes(&self) -> Result<Vec<String>, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("invite source down".to_string()));
        }
        Ok(self.codes.lock().unwrap().clone())
    }
}

pub struct MockGateway {
    pub status: Mutex<GatewayOrderStatus>,
    pub orders: Mutex<Vec<GatewayOrderRequest>>,
    pub fail_status_query: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(GatewayOrderStatus {
                status: GatewayTxStatus::Pending,
                payment_id: None,
                payment_method: None,
                failure_reason: None,
            }),
            orders: Mutex::new(Vec::new()),
            fail_status_query: AtomicBool::new(false),
        }
    }

    pub fn set_status(&self, status: GatewayOrderStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn success(payment_id: &str) -> GatewayOrderStatus {
        GatewayOrderStatus {
            status: GatewayTxStatus::Success,
            payment_id: Some(payment_id.to_string()),
            payment_method: Some("UPI".to_string()),
            failure_reason: None,
        }
    }

    pub fn failed(reason: &str) -> GatewayOrderStatus {
        GatewayOrderStatus {
            status: GatewayTxStatus::Failed,
            payment_id: Some("pay_failed".to_string()),
            payment_method: Some("CARD".to_string()),
            failure_reason: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrderSession, AppError> {
        self.orders.lock().unwrap().push(request.clone());
        Ok(GatewayOrderSession {
            order_id: request.order_id.clone(),
            session_token: format!("session_{}", request.order_id),
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }

    async fn order_status(&self, _order_id: &str) -> Result<GatewayOrderStatus, AppError> {
        if self.fail_status_query.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("status query down".to_string()));
        }
        Ok(self.status.lock().unwrap().clone())
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Mutex::new(Utc::now()) }
    }

    pub fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub sheet: Arc<MockSheetService>,
    pub source: Arc<MockInviteSource>,
    pub gateway: Arc<MockGateway>,
    pub clock: Arc<ManualClock>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template(
            "ticket_confirmation.html",
            "<html>Ticket {{ reference_number }} for {{ customer_name }}</html>",
        ).unwrap();
        tera.add_raw_template(
            "payment_failed.html",
            "<html>Payment failed for {{ customer_name }}</html>",
        ).unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            gateway_base_url: "http://localhost".to_string(),
            gateway_app_id: "app".to_string(),
            gateway_secret_key: TEST_WEBHOOK_SECRET.to_string(),
            sheet_service_url: "http://localhost".to_string(),
            sheet_service_token: "token".to_string(),
            invite_fallback_codes: vec!["FALLBACK2025".to_string()],
            frontend_url: "http://localhost:5173".to_string(),
            admin_token: TEST_ADMIN_TOKEN.to_string(),
        };

        let email = Arc::new(MockEmailService::new());
        let sheet = Arc::new(MockSheetService::new());
        let source = Arc::new(MockInviteSource::new(vec!["SLANUP2025", "DIWCODE1", "DIWCODE2"]));
        let gateway = Arc::new(MockGateway::new());
        let clock = Arc::new(ManualClock::new());

        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let webhook_repo = Arc::new(SqliteWebhookRepo::new(pool.clone()));
        let job_repo = Arc::new(SqliteJobRepo::new(pool.clone()));

        let invite_registry = Arc::new(InviteRegistry::new(
            source.clone(),
            clock.clone(),
            config.invite_fallback_codes.clone(),
        ));

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

        let state = Arc::new(AppState {
            config: config.clone(),
            booking_repo,
            webhook_repo,
            job_repo,
            email_service: email.clone(),
            sheet_service: sheet.clone(),
            invite_registry,
            booking_service,
            reconciliation,
            clock: clock.clone(),
            templates,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            email,
            sheet,
            source,
            gateway,
            clock,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        ).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        ).await.unwrap()
    }

    pub async fn admin_get(&self, uri: &str) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("X-Admin-Token", TEST_ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap()
        ).await.unwrap()
    }

    pub async fn admin_post(&self, uri: &str) -> axum::response::Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("X-Admin-Token", TEST_ADMIN_TOKEN)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap()
        ).await.unwrap()
    }

    pub async fn create_booking(&self, invite_code: &str, ticket_type: &str, ticket_count: i32) -> Value {
        let response = self.post_json("/api/v1/bookings", json!({
            "invite_code": invite_code,
            "customer_name": "Asha Rao",
            "customer_email": "asha@example.com",
            "customer_phone": "9876543210",
            "ticket_type": ticket_type,
            "ticket_count": ticket_count,
        })).await;

        assert!(
            response.status().is_success(),
            "booking creation failed with status {}",
            response.status()
        );
        parse_body(response).await
    }

    /// A correctly signed webhook payload, the way the gateway would send it.
    pub fn webhook_payload(&self, order_id: &str, amount: &str, reference_id: &str, tx_status: &str) -> Value {
        let payment_mode = "UPI";
        let tx_msg = "Transaction message";
        let tx_time = "2025-10-20 19:30:00";

        let payload = format!(
            "{}{}{}{}{}{}{}",
            order_id, amount, reference_id, tx_status, payment_mode, tx_msg, tx_time
        );
        let signature = compute_signature(&payload, TEST_WEBHOOK_SECRET);

        json!({
            "orderId": order_id,
            "orderAmount": amount,
            "referenceId": reference_id,
            "txStatus": tx_status,
            "paymentMode": payment_mode,
            "txMsg": tx_msg,
            "txTime": tx_time,
            "signature": signature,
        })
    }

    pub async fn run_jobs(&self) {
        background::run_pending_jobs(&self.state).await;
    }

    pub async fn job_statuses(&self, job_type: &str) -> Vec<String> {
        sqlx::query_scalar::<_, String>("SELECT status FROM jobs WHERE job_type = ? ORDER BY created_at")
            .bind(job_type)
            .fetch_all(&self.pool)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
