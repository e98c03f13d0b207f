use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SesConfig {
    pub from_address: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Overrides the scheme+host used to build links handed to creators.
    pub public_base_url: Option<String>,
    pub ses: Option<SesConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let ses = optional("SES_FROM_ADDRESS").map(|from_address| SesConfig {
            from_address,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into()),
            access_key: optional("SES_ACCESS_KEY"),
            secret_key: optional("SES_SECRET_KEY"),
        });

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .map(|v| v.parse::<u16>())
                .transpose()?
                .unwrap_or(8080),
            database_url: optional("DATABASE_URL"),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            public_base_url: optional("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string()),
            ses,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
