use serde::Deserialize;

/// Upper bound on bearer token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "appusers".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "partner-apps".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60)
                .clamp(1, MAX_TTL_MINUTES),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig::from_env()?;
        Ok(Self {
            database_url,
            db_max_connections,
            jwt,
        })
    }
}
