use std::env;
use std::time::Duration;

use tracing::warn;

/// What to do with an appointment whose date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidDatePolicy {
    /// Leave the record out of every view and report it.
    #[default]
    Quarantine,
    /// Use the current instant and log a warning.
    SubstituteNow,
}

impl InvalidDatePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quarantine" => Some(Self::Quarantine),
            "now" | "substitute_now" => Some(Self::SubstituteNow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub schedule_api_url: String,
    pub pets_api_url: String,
    pub notifications_api_url: String,
    pub backend_timeout: Duration,
    pub invalid_date_policy: InvalidDatePolicy,
    pub server_port: u16,
    /// When set, bearer tokens must carry a valid HS256 signature.
    pub jwt_secret: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schedule_api_url: "http://localhost:5000".to_string(),
            pets_api_url: "http://localhost:5264".to_string(),
            notifications_api_url: "http://localhost:5222".to_string(),
            backend_timeout: Duration::from_secs(30),
            invalid_date_policy: InvalidDatePolicy::Quarantine,
            server_port: 3000,
            jwt_secret: None,
        }
    }
}

fn url_var(name: &str, default: &str) -> String {
    env::var(name)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| {
            warn!("{} not set, using default {}", name, default);
            default.to_string()
        })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend_timeout = match env::var("BACKEND_TIMEOUT_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!("BACKEND_TIMEOUT_SECS={} is not a positive integer, using default", raw);
                    defaults.backend_timeout
                }
            },
            Err(_) => defaults.backend_timeout,
        };

        let invalid_date_policy = match env::var("INVALID_DATE_POLICY") {
            Ok(raw) => InvalidDatePolicy::parse(&raw).unwrap_or_else(|| {
                warn!("INVALID_DATE_POLICY={} not recognized, quarantining invalid dates", raw);
                InvalidDatePolicy::Quarantine
            }),
            Err(_) => defaults.invalid_date_policy,
        };

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.server_port);

        let config = Self {
            schedule_api_url: url_var("SCHEDULE_API_URL", &defaults.schedule_api_url),
            pets_api_url: url_var("PETS_API_URL", &defaults.pets_api_url),
            notifications_api_url: url_var("NOTIFICATIONS_API_URL", &defaults.notifications_api_url),
            backend_timeout,
            invalid_date_policy,
            server_port,
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
        };

        if config.jwt_secret.is_none() {
            warn!("JWT_SECRET not set, token signatures are left to the backend");
        }

        if !config.is_configured() {
            warn!("Backend URLs incomplete - some cells will not be able to reach the clinic backend");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.schedule_api_url.is_empty()
            && !self.pets_api_url.is_empty()
            && !self.notifications_api_url.is_empty()
    }

    /// Config pointing every backend at the same base URL. Handy for tests
    /// that stand one mock server in for all services.
    pub fn with_backend(base_url: &str) -> Self {
        Self {
            schedule_api_url: base_url.to_string(),
            pets_api_url: base_url.to_string(),
            notifications_api_url: base_url.to_string(),
            ..Self::default()
        }
    }
}
