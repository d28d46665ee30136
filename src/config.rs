use std::collections::HashSet;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

/// Numbered key variables are probed up to this index.
const MAX_NUMBERED_KEYS: usize = 10;

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// OpenRouter API keys, in rotation order. May be empty; the
    /// summarize endpoint reports NotConfigured per-request in that case.
    /// Read once at startup: env changes made while the process is
    /// running are not picked up.
    pub api_keys: Vec<String>,
    /// Sent as the HTTP-Referer header on OpenRouter calls.
    pub referer: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let api_keys = collect_api_keys(|name| env::var(name).ok());
        let referer = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // Server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            api_keys,
            referer,
        })
    }
}

/// Collects OpenRouter API keys from numbered variables
/// (`OPENROUTER_API_KEY_1` .. `OPENROUTER_API_KEY_10`), then the
/// unnumbered `OPENROUTER_API_KEY` as a fallback. Values are trimmed,
/// empties skipped, and duplicates dropped preserving first-seen order.
pub fn collect_api_keys<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys = Vec::new();

    for i in 1..=MAX_NUMBERED_KEYS {
        if let Some(val) = lookup(&format!("OPENROUTER_API_KEY_{}", i)) {
            let val = val.trim();
            if !val.is_empty() {
                keys.push(val.to_string());
            }
        }
    }

    if let Some(val) = lookup("OPENROUTER_API_KEY") {
        let val = val.trim();
        if !val.is_empty() {
            keys.push(val.to_string());
        }
    }

    let mut seen = HashSet::new();
    keys.retain(|k| seen.insert(k.clone()));
    keys
}
