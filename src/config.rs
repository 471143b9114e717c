use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_busy_timeout: Duration,
    pub frontend_url: String,
    pub reset_token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub jwt_secret: Option<String>,
    pub jwt_expires_in: String,
    /// When set, certificates are only issued for enrollments at 100% progress.
    pub certificate_requires_completion: bool,
    pub seed_catalog: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_parse::<u16>("PORT").unwrap_or(8000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            database_url: env_string("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://lms.db".to_string()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(5),
            db_busy_timeout: Duration::from_millis(
                env_parse("DB_BUSY_TIMEOUT_MS").unwrap_or(5000),
            ),
            frontend_url: env_string("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5174".to_string()),
            reset_token_ttl_minutes: env_parse("RESET_TOKEN_TTL_MINUTES").unwrap_or(60),
            bcrypt_cost: env_parse("BCRYPT_COST").unwrap_or(bcrypt::DEFAULT_COST),
            jwt_secret: env_string("JWT_SECRET"),
            jwt_expires_in: env_string("JWT_EXPIRES_IN").unwrap_or_else(|| "24h".to_string()),
            certificate_requires_completion: env_bool("CERTIFICATE_REQUIRES_COMPLETION")
                .unwrap_or(false),
            seed_catalog: env_bool("SEED_CATALOG").unwrap_or(true),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn frontend_link(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.frontend_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key)?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            log_level: "info".to_string(),
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            db_busy_timeout: Duration::from_secs(1),
            frontend_url: "http://localhost:5174/".to_string(),
            reset_token_ttl_minutes: 60,
            bcrypt_cost: 4,
            jwt_secret: None,
            jwt_expires_in: "24h".to_string(),
            certificate_requires_completion: false,
            seed_catalog: false,
        }
    }

    #[test]
    fn frontend_link_joins_without_double_slash() {
        let config = sample();
        assert_eq!(
            config.frontend_link("/reset-password?token=abc"),
            "http://localhost:5174/reset-password?token=abc"
        );
    }

    #[test]
    fn bind_addr_uses_host_and_port() {
        let config = sample();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8000");
    }
}
