use thiserror::Error;

/// Startup configuration problems. These abort the process and are never
/// converted into an HTTP response.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("JWT_SECRET must not be empty")]
    EmptySecret,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC signing secret, required.
    pub secret: String,
    pub issuer: String,
    /// Token lifetime in minutes.
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?;
        Ok(Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "userhub".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        Ok(Self {
            database_url,
            jwt: JwtConfig::from_env()?,
        })
    }
}
