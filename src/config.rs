use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub gateway_base_url: String,
    pub gateway_app_id: String,
    pub gateway_secret_key: String,
    pub sheet_service_url: String,
    pub sheet_service_token: String,
    pub invite_fallback_codes: Vec<String>,
    pub frontend_url: String,
    pub admin_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            gateway_base_url: env::var("GATEWAY_BASE_URL").unwrap_or_else(|_| "https://sandbox.gateway.local".to_string()),
            gateway_app_id: env::var("GATEWAY_APP_ID").expect("GATEWAY_APP_ID must be set"),
            gateway_secret_key: env::var("GATEWAY_SECRET_KEY").expect("GATEWAY_SECRET_KEY must be set"),
            sheet_service_url: env::var("SHEET_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8001/api/sheet".to_string()),
            sheet_service_token: env::var("SHEET_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-2".to_string()),
            invite_fallback_codes: env::var("INVITE_FALLBACK_CODES")
                .unwrap_or_default()
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            admin_token: env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set"),
        }
    }
}
