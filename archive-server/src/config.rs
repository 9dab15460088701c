use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    /// Shared secret used to verify bearer tokens issued by the campus
    /// auth service (HS256).
    pub auth_secret: String,
    pub port: u16,
    /// Directory for persistent state (SQLite database).
    /// Defaults to current working directory.
    pub state_dir: PathBuf,
    /// Optional bearer token for the /status endpoint.
    /// If not set, /status is disabled.
    pub status_auth_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let auth_secret =
            env::var("AUTH_SECRET").context("AUTH_SECRET environment variable is required")?;
        if auth_secret.trim().is_empty() {
            anyhow::bail!("AUTH_SECRET must not be empty");
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let state_dir = env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let status_auth_token = parse_status_auth_token(env::var("STATUS_AUTH_TOKEN").ok());

        Ok(Config {
            auth_secret,
            port,
            state_dir,
            status_auth_token,
        })
    }
}

/// Parse STATUS_AUTH_TOKEN from an optional string value.
///
/// Returns None if the value is missing, empty, or contains only whitespace,
/// so an empty token can never grant unauthenticated access.
pub fn parse_status_auth_token(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_auth_token_none() {
        assert_eq!(parse_status_auth_token(None), None);
    }

    #[test]
    fn test_parse_status_auth_token_blank() {
        assert_eq!(parse_status_auth_token(Some("".to_string())), None);
        assert_eq!(parse_status_auth_token(Some("  \t".to_string())), None);
    }

    #[test]
    fn test_parse_status_auth_token_valid() {
        assert_eq!(
            parse_status_auth_token(Some("operator-token".to_string())),
            Some("operator-token".to_string())
        );
    }
}
