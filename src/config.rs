use std::env;
use std::time::Duration;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub cache_ttl: Duration,
    /// Username allowed to run commissioner actions in every league.
    pub admin_user: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://fantasy_rugby.db?mode=rwc".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: "change-me".to_string(),
            cache_ttl: Duration::from_secs(30),
            admin_user: "admin".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            cache_ttl: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            admin_user: env::var("ADMIN_USER").unwrap_or(defaults.admin_user),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_user == username
    }
}
