//! Environment-driven configuration.
//!
//! All tunables named in the spec's External Interfaces section are read
//! once at startup; nothing here is re-read at runtime.

use std::time::Duration;

/// Top-level application configuration, assembled from environment
/// variables with documented defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub redis: RedisConfig,
    pub jwt_secret: String,
    pub http_port: u16,

    pub dispatch: DispatchConfig,
    pub cache_ttl: Duration,
    pub cleanup: CleanupConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
    pub pool_size: u32,
}

impl DbConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.sslmode
        )
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(pw) if !pw.is_empty() => format!("redis://:{}@{}/{}", pw, self.addr, self.db),
            _ => format!("redis://{}/{}", self.addr, self.db),
        }
    }
}

/// Dispatch Engine tunables (spec.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// R_max: pickup radius in kilometers.
    pub radius_km: f64,
    /// N_max: candidate cap per dispatch run.
    pub max_candidates: usize,
    /// T_offer: per-courier offer timeout.
    pub offer_timeout: Duration,
    /// T_dispatch: overall dispatch deadline before DispatchFailed.
    pub dispatch_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            max_candidates: 20,
            offer_timeout: Duration::from_secs(10),
            dispatch_timeout: Duration::from_secs(120),
        }
    }
}

/// Cleanup Scheduler tunables (spec.md §4.5).
#[derive(Debug, Clone, Copy)]
pub struct CleanupConfig {
    pub interval: Duration,
    pub retention: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(7 * 24 * 3600),
            retention: Duration::from_secs(14 * 24 * 3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub log_file: String,
    pub log_level: String,
    pub rotation: String,
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_file: "takeout-core.log".to_string(),
            log_level: "info".to_string(),
            rotation: "daily".to_string(),
            use_json: false,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from the environment. Missing optional variables
    /// fall back to the defaults documented in spec.md §6/§4.
    pub fn from_env() -> anyhow::Result<Self> {
        let db = DbConfig {
            host: env_or("DB_HOST", "localhost"),
            port: env_parse("DB_PORT", 5432),
            user: env_or("DB_USER", "takeout"),
            password: env_or("DB_PASSWORD", ""),
            name: env_or("DB_NAME", "takeout"),
            sslmode: env_or("DB_SSLMODE", "disable"),
            pool_size: env_parse("DB_POOL_SIZE", 100),
        };

        let redis = RedisConfig {
            addr: env_or("REDIS_ADDR", "localhost:6379"),
            password: std::env::var("REDIS_PASSWORD").ok(),
            db: env_parse("REDIS_DB", 0),
        };

        let jwt_secret = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET_KEY must be set"))?;

        Ok(Self {
            db,
            redis,
            jwt_secret,
            http_port: env_parse("HTTP_PORT", 8080),
            dispatch: DispatchConfig {
                radius_km: env_parse("DISPATCH_RADIUS_KM", DispatchConfig::default().radius_km),
                max_candidates: env_parse(
                    "DISPATCH_MAX_CANDIDATES",
                    DispatchConfig::default().max_candidates,
                ),
                offer_timeout: Duration::from_secs(env_parse("DISPATCH_OFFER_TIMEOUT_SECS", 10)),
                dispatch_timeout: Duration::from_secs(env_parse("DISPATCH_TIMEOUT_SECS", 120)),
            },
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", 3600)),
            cleanup: CleanupConfig {
                interval: Duration::from_secs(env_parse(
                    "CLEANUP_INTERVAL_SECS",
                    CleanupConfig::default().interval.as_secs(),
                )),
                retention: Duration::from_secs(env_parse(
                    "RETENTION_SECS",
                    CleanupConfig::default().retention.as_secs(),
                )),
            },
            logging: LoggingConfig {
                log_dir: env_or("LOG_DIR", &LoggingConfig::default().log_dir),
                log_file: env_or("LOG_FILE", &LoggingConfig::default().log_file),
                log_level: env_or("LOG_LEVEL", &LoggingConfig::default().log_level),
                rotation: env_or("LOG_ROTATION", &LoggingConfig::default().rotation),
                use_json: env_parse("LOG_JSON", false),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_connection_url_format() {
        let db = DbConfig {
            host: "db.internal".into(),
            port: 5432,
            user: "u".into(),
            password: "p".into(),
            name: "takeout".into(),
            sslmode: "require".into(),
            pool_size: 10,
        };
        assert_eq!(
            db.connection_url(),
            "postgres://u:p@db.internal:5432/takeout?sslmode=require"
        );
    }

    #[test]
    fn redis_url_without_password() {
        let redis = RedisConfig {
            addr: "localhost:6379".into(),
            password: None,
            db: 0,
        };
        assert_eq!(redis.connection_url(), "redis://localhost:6379/0");
    }

    #[test]
    fn dispatch_defaults_match_spec() {
        let d = DispatchConfig::default();
        assert_eq!(d.radius_km, 5.0);
        assert_eq!(d.max_candidates, 20);
        assert_eq!(d.offer_timeout, Duration::from_secs(10));
        assert_eq!(d.dispatch_timeout, Duration::from_secs(120));
    }
}
