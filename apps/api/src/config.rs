use anyhow::{bail, Context, Result};

const DEFAULT_PLAN_STORE_CAPACITY: usize = 1000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// When unset, hackathon records are kept in process memory.
    pub database_url: Option<String>,
    pub plan_store_capacity: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let plan_store_capacity = match std::env::var("PLAN_STORE_CAPACITY") {
            Ok(raw) => raw
                .parse::<usize>()
                .context("PLAN_STORE_CAPACITY must be a positive integer")?,
            Err(_) => DEFAULT_PLAN_STORE_CAPACITY,
        };
        if plan_store_capacity == 0 {
            bail!("PLAN_STORE_CAPACITY must be at least 1");
        }

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            plan_store_capacity,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
