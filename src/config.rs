use std::env;
use dotenvy::dotenv;

use crate::model::coach::StaffRole;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_account_per_min: u32,

    pub api_prefix: String,

    /// Seconds between rebuilds of the coach email index.
    pub email_index_refresh_secs: u64,

    pub payroll: PayrollSettings,
}

/// Settings the payroll aggregation needs. Passed explicitly, never read from globals.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollSettings {
    pub currency: String,
    /// Staff roles that never appear on payroll.
    pub excluded_roles: Vec<StaffRole>,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            excluded_roles: vec![StaffRole::Admin],
        }
    }
}

impl PayrollSettings {
    pub fn is_excluded(&self, role: StaffRole) -> bool {
        self.excluded_roles.contains(&role)
    }
}

/// Parses a comma separated role list such as `admin,cleaner`.
/// Unknown names are skipped.
pub fn parse_role_list(raw: &str) -> Vec<StaffRole> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<StaffRole>().ok())
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("RATE_PROTECTED_PER_MIN must be a number"),
            rate_account_per_min: env::var("RATE_ACCOUNT_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("RATE_ACCOUNT_PER_MIN must be a number"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            email_index_refresh_secs: env::var("EMAIL_INDEX_REFRESH_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .expect("EMAIL_INDEX_REFRESH_SECS must be a number"),

            payroll: PayrollSettings {
                currency: env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string()),
                excluded_roles: parse_role_list(
                    &env::var("PAYROLL_EXCLUDED_ROLES").unwrap_or_else(|_| "admin".to_string()),
                ),
            },
        }
    }
}
