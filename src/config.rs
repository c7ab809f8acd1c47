use thiserror::Error;
use tracing::warn;

pub const DEV_SESSION_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Supabase project, without a trailing slash.
    pub supabase_url: String,
    /// Anonymous API key, also the bearer fallback for unauthenticated calls.
    pub supabase_anon_key: String,
    /// Key for the session cookie signer.
    pub session_secret: String,
    /// Lowercased admin email allow-list.
    pub admin_emails: Vec<String>,
    /// Set the `Secure` cookie attribute. Off by default for local development;
    /// must be enabled on any public deployment.
    pub cookie_secure: bool,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = require("SUPABASE_URL")?.trim_end_matches('/').to_string();
        let supabase_anon_key = require("SUPABASE_ANON_KEY")?;

        let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            warn!("SESSION_SECRET not set, using insecure development default");
            DEV_SESSION_SECRET.into()
        });

        let admin_emails = std::env::var("ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidVar("APP_PORT", e.to_string()))?,
            Err(_) => 8000,
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            session_secret,
            admin_emails,
            cookie_secure,
            host,
            port,
        })
    }

    /// Admin check is by email, case-insensitive.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_admins(admins: &[&str]) -> AppConfig {
        AppConfig {
            supabase_url: "https://example.supabase.co".into(),
            supabase_anon_key: "anon".into(),
            session_secret: "test".into(),
            admin_emails: admins.iter().map(|e| e.to_lowercase()).collect(),
            cookie_secure: false,
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }

    #[test]
    fn admin_check_is_case_insensitive() {
        let config = config_with_admins(&["Librarian@Example.com"]);
        assert!(config.is_admin("librarian@example.com"));
        assert!(config.is_admin("LIBRARIAN@EXAMPLE.COM"));
        assert!(!config.is_admin("reader@example.com"));
    }

    #[test]
    fn admin_check_with_empty_allow_list() {
        let config = config_with_admins(&[]);
        assert!(!config.is_admin("anyone@example.com"));
    }
}
