use crate::auth::JwtConfig;
use crate::pricing::PricingDefaults;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file is
/// loaded first by `main`):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | dispatch.db | SQLite file |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | default tracing level |
/// | LOG_DIR | (unset) | daily rolling log directory |
/// | LOG_JSON | false | JSON log lines |
/// | GEOCODER_URL | https://nominatim.openstreetmap.org/search | geocoding endpoint |
/// | GEOCODER_USER_AGENT | dispatch-server/0.1 | geocoder User-Agent |
/// | GEOCODER_TIMEOUT_MS | 5000 | geocoder request timeout |
/// | SIDE_EFFECT_MAX_RETRIES | 5 | attempts before dead-lettering |
/// | SIDE_EFFECT_SCAN_INTERVAL_SECS | 30 | outbox rescan period |
/// | REALTIME_CONNECTION_BUFFER | 256 | per-connection event buffer |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout |
///
/// JWT settings come from [`JwtConfig`], pricing defaults from
/// [`PricingDefaults`] (`DELIVERY_DEFAULT_*`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub http_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    pub jwt: JwtConfig,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_ms: u64,
    pub pricing: PricingDefaults,
    pub side_effect_max_retries: u32,
    pub side_effect_scan_interval_secs: u64,
    pub realtime_connection_buffer: usize,
    pub request_timeout_ms: u64,
}

/// Parse an env var, falling back to `default` when unset or malformed
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "dispatch.db".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            log_json: env_or("LOG_JSON", false),
            jwt: JwtConfig::from_env(),
            geocoder_url: std::env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org/search".into()),
            geocoder_user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "dispatch-server/0.1".into()),
            geocoder_timeout_ms: env_or("GEOCODER_TIMEOUT_MS", 5000),
            pricing: PricingDefaults::from_env(),
            side_effect_max_retries: env_or("SIDE_EFFECT_MAX_RETRIES", 5),
            side_effect_scan_interval_secs: env_or("SIDE_EFFECT_SCAN_INTERVAL_SECS", 30),
            realtime_connection_buffer: env_or("REALTIME_CONNECTION_BUFFER", 256),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
        }
    }

    /// Configuration for tests: in-memory database, fixed JWT secret
    pub fn for_tests() -> Self {
        let mut config = Self::from_env();
        config.database_path = ":memory:".into();
        config.environment = "test".into();
        config.jwt = JwtConfig::with_secret("test-secret-key-that-is-long-enough-1234");
        config.pricing = PricingDefaults::default();
        config.side_effect_scan_interval_secs = 1;
        config
    }

    /// Whether running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
