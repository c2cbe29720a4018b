use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::cli::Command;

/// SSW Galaxy command-line client
#[derive(Parser, Debug)]
#[command(name = "ssw", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Backend API base URL
    #[arg(
        short = 'u',
        long,
        env = "SSW_API_BASE_URL",
        default_value = "http://localhost:8080/v1"
    )]
    pub base_url: String,

    /// Path to the SQLite token database
    #[arg(short = 'd', long, env = "SSW_TOKEN_DB")]
    pub token_db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Upper bound for a single token refresh, in seconds
    #[arg(long, env = "TOKEN_REFRESH_TIMEOUT", default_value = "10")]
    pub refresh_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings for the authenticated API client
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: u64,
    pub request_timeout: u64,
    pub max_connections: usize,
    pub refresh_timeout: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            connect_timeout: 10,
            request_timeout: 30,
            max_connections: 10,
            refresh_timeout: 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub client: ClientSettings,
    pub token_db: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults.
    /// `.env` must already be loaded before the arguments are parsed.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let defaults = ClientSettings::default();

        let token_db = args
            .token_db
            .as_deref()
            .map(expand_tilde)
            .or_else(default_token_db_path)
            .context("Could not determine a token database path (use -d or set SSW_TOKEN_DB)")?;

        Ok(Config {
            client: ClientSettings {
                base_url: args.base_url.clone(),

                connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.connect_timeout),

                request_timeout: args.http_timeout,

                max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_connections),

                refresh_timeout: args.refresh_timeout,
            },
            token_db,
            log_level: args.log_level.clone(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.client.base_url)
            .with_context(|| format!("SSW_API_BASE_URL is not a valid URL: {}", self.client.base_url))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!(
                "SSW_API_BASE_URL must use http or https, got: {}",
                url.scheme()
            );
        }

        if self.client.request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        if self.client.refresh_timeout == 0 {
            anyhow::bail!("TOKEN_REFRESH_TIMEOUT must be greater than zero");
        }

        Ok(())
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Platform data directory, e.g. ~/.local/share/ssw/tokens.sqlite3 on Linux
fn default_token_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("ssw").join("tokens.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(base_url: &str) -> Config {
        Config {
            client: ClientSettings {
                base_url: base_url.to_string(),
                ..ClientSettings::default()
            },
            token_db: PathBuf::from("/tmp/ssw-tokens.sqlite3"),
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/file.txt");
        assert!(path.to_string_lossy().contains("test/file.txt"));
        assert!(!path.to_string_lossy().starts_with('~'));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_validate_accepts_http_urls() {
        assert!(config_with_url("http://localhost:8080/v1").validate().is_ok());
        assert!(config_with_url("https://api.example.com/v1").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(config_with_url("localhost:8080").validate().is_err());
        assert!(config_with_url("ftp://example.com").validate().is_err());
        assert!(config_with_url("not a url").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = config_with_url("http://localhost:8080/v1");
        config.client.refresh_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_args_prefers_cli_token_db() {
        let args = CliArgs::parse_from([
            "ssw",
            "--base-url",
            "http://127.0.0.1:9000/v1",
            "--token-db",
            "/tmp/custom.sqlite3",
            "logout",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.client.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.token_db, PathBuf::from("/tmp/custom.sqlite3"));
    }
}
