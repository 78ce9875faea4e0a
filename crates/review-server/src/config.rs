use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_DB_PATH: &str = "review.db";

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    /// Seeds reviewer selection for reproducible runs; OS randomness when unset.
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("REVIEW_HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let port: u16 = std::env::var("REVIEW_PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.into())
            .parse()
            .context("REVIEW_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let db_path: PathBuf = std::env::var("REVIEW_DB_PATH")
            .unwrap_or_else(|_| DEFAULT_DB_PATH.into())
            .into();

        let rng_seed = match std::env::var("REVIEW_RNG_SEED") {
            Ok(raw) => Some(raw.parse().context("REVIEW_RNG_SEED must be an unsigned integer")?),
            Err(_) => None,
        };

        Ok(Self {
            addr,
            db_path,
            rng_seed,
        })
    }
}
