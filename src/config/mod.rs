use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitSettings,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub jwt_leeway_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Quota for one limiter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self { max_requests, window_secs }
    }
}

const FIFTEEN_MINUTES: u64 = 15 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Security-sensitive admin routes (users, roles, tokens)
    pub security: RateLimitConfig,
    /// Admin configuration routes
    pub admin: RateLimitConfig,
    /// General authenticated API, keyed by client address
    pub api: RateLimitConfig,
    /// AI-invoking routes, keyed by authenticated user id
    pub ai_per_user: RateLimitConfig,
    /// Upper bound on distinct keys tracked per limiter
    pub max_tracked_keys: usize,
    /// Stale keys are swept every this many admissions
    pub sweep_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("rate limit '{0}' must allow at least one request per non-empty window")]
    InvalidRateLimit(&'static str),
    #[error("AGENT_SERVICE_URL must be an http(s) URL, got '{0}'")]
    InvalidAgentUrl(String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .as_deref()
        {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SOCIAL_ADMIN_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_JWT_LEEWAY_SECS") {
            self.security.jwt_leeway_secs = v.parse().unwrap_or(self.security.jwt_leeway_secs);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Rate limit overrides
        override_quota(&mut self.rate_limit.security, "RATE_LIMIT_SECURITY");
        override_quota(&mut self.rate_limit.admin, "RATE_LIMIT_ADMIN");
        override_quota(&mut self.rate_limit.api, "RATE_LIMIT_API");
        override_quota(&mut self.rate_limit.ai_per_user, "AI_RATE_LIMIT");
        if let Ok(v) = env::var("RATE_LIMIT_MAX_KEYS") {
            self.rate_limit.max_tracked_keys = v.parse().unwrap_or(self.rate_limit.max_tracked_keys);
        }
        if let Ok(v) = env::var("RATE_LIMIT_SWEEP_INTERVAL") {
            self.rate_limit.sweep_interval = v.parse().unwrap_or(self.rate_limit.sweep_interval);
        }

        // Agent service overrides
        if let Ok(v) = env::var("AGENT_SERVICE_URL") {
            self.agent.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("AGENT_SERVICE_TIMEOUT_SECS") {
            self.agent.timeout_secs = v.parse().unwrap_or(self.agent.timeout_secs);
        }

        self
    }

    /// Reject configurations the server cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        let quotas = [
            ("security", self.rate_limit.security),
            ("admin", self.rate_limit.admin),
            ("api", self.rate_limit.api),
            ("ai_per_user", self.rate_limit.ai_per_user),
        ];
        for (name, quota) in quotas {
            if quota.max_requests == 0 || quota.window_secs == 0 {
                return Err(ConfigError::InvalidRateLimit(name));
            }
        }

        if !self.agent.base_url.starts_with("http://") && !self.agent.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidAgentUrl(self.agent.base_url.clone()));
        }

        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                jwt_leeway_secs: 30,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            rate_limit: RateLimitSettings {
                security: RateLimitConfig::new(50, FIFTEEN_MINUTES),
                admin: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                api: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                ai_per_user: RateLimitConfig::new(20, 60 * 60),
                max_tracked_keys: 10_000,
                sweep_interval: 1_000,
            },
            agent: AgentConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 60,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 5000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_leeway_secs: 30,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            rate_limit: RateLimitSettings {
                security: RateLimitConfig::new(50, FIFTEEN_MINUTES),
                admin: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                api: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                ai_per_user: RateLimitConfig::new(20, 60 * 60),
                max_tracked_keys: 50_000,
                sweep_interval: 1_000,
            },
            agent: AgentConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 60,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 5000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_leeway_secs: 30,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            rate_limit: RateLimitSettings {
                security: RateLimitConfig::new(50, FIFTEEN_MINUTES),
                admin: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                api: RateLimitConfig::new(100, FIFTEEN_MINUTES),
                ai_per_user: RateLimitConfig::new(10, 60 * 60),
                max_tracked_keys: 100_000,
                sweep_interval: 5_000,
            },
            agent: AgentConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

fn override_quota(quota: &mut RateLimitConfig, prefix: &str) {
    if let Ok(v) = env::var(format!("{prefix}_MAX_REQUESTS")) {
        quota.max_requests = v.parse().unwrap_or(quota.max_requests);
    }
    if let Ok(v) = env::var(format!("{prefix}_WINDOW_SECS")) {
        quota.window_secs = v.parse().unwrap_or(quota.window_secs);
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
