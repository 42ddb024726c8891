// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup and injected into the router through `AppState`.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the redb database | `./data` |
//! | `PUBLIC_APP_URL` | Public origin for verification links | request `Origin`; link-building requests fail without either |
//! | `ZAPPER_API_KEY` | EVM portfolio indexer key | Required for EVM lookups |
//! | `HELIUS_API_KEY` | Solana DAS indexer key | Required for Solana lookups |
//! | `STRIPE_SECRET_KEY` | Payment provider secret key | Required for checkout |
//! | `STRIPE_PRICE_ID` | Fixed-price checkout item | Required for checkout |
//! | `SESSION_TTL_SECS` | Payment session lifetime | `3600` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Expired session sweep period | `300` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM pair enabling HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Provider keys are optional at startup. A missing key surfaces as a
//! configuration error on the first request that needs it.

use std::path::PathBuf;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Directory for the embedded database file.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Public origin of the web application (e.g. `https://wallet-scan.io`).
pub const PUBLIC_APP_URL_ENV: &str = "PUBLIC_APP_URL";

pub const ZAPPER_API_KEY_ENV: &str = "ZAPPER_API_KEY";
pub const ZAPPER_API_URL_ENV: &str = "ZAPPER_API_URL";
pub const HELIUS_API_KEY_ENV: &str = "HELIUS_API_KEY";
pub const HELIUS_MAINNET_URL_ENV: &str = "HELIUS_MAINNET_URL";
pub const HELIUS_DEVNET_URL_ENV: &str = "HELIUS_DEVNET_URL";
pub const BLOCKCHAIN_INFO_URL_ENV: &str = "BLOCKCHAIN_INFO_URL";
pub const COINGECKO_API_URL_ENV: &str = "COINGECKO_API_URL";
pub const STRIPE_SECRET_KEY_ENV: &str = "STRIPE_SECRET_KEY";
pub const STRIPE_PRICE_ID_ENV: &str = "STRIPE_PRICE_ID";
pub const STRIPE_API_BASE_URL_ENV: &str = "STRIPE_API_BASE_URL";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_SWEEP_INTERVAL_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const DEFAULT_ZAPPER_API_URL: &str = "https://public.zapper.xyz/graphql";
pub const DEFAULT_HELIUS_MAINNET_URL: &str = "https://mainnet.helius-rpc.com";
pub const DEFAULT_HELIUS_DEVNET_URL: &str = "https://devnet.helius-rpc.com";
pub const DEFAULT_BLOCKCHAIN_INFO_URL: &str = "https://blockchain.info";
pub const DEFAULT_COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com";

/// Payment sessions disappear one hour after checkout starts.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Name of the database file inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "walletscan.redb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Upstream endpoints and credentials for the balance indexers.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub zapper_api_url: String,
    pub zapper_api_key: Option<String>,
    pub helius_mainnet_url: String,
    pub helius_devnet_url: String,
    pub helius_api_key: Option<String>,
    pub blockchain_info_url: String,
    pub coingecko_api_url: String,
}

/// Payment provider credentials.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_base_url: String,
    pub secret_key: Option<String>,
    pub price_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_app_url: Option<String>,
    pub indexers: IndexerConfig,
    pub stripe: StripeConfig,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        let tls = match (env_optional(TLS_CERT_PATH_ENV), env_optional(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            _ => None,
        };

        Self {
            host: env_or_default(HOST_ENV, DEFAULT_HOST),
            port: env_optional(PORT_ENV)
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            data_dir: PathBuf::from(env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR)),
            public_app_url: env_optional(PUBLIC_APP_URL_ENV)
                .map(|url| url.trim_end_matches('/').to_string()),
            indexers: IndexerConfig {
                zapper_api_url: env_or_default(ZAPPER_API_URL_ENV, DEFAULT_ZAPPER_API_URL),
                zapper_api_key: env_optional(ZAPPER_API_KEY_ENV),
                helius_mainnet_url: env_or_default(
                    HELIUS_MAINNET_URL_ENV,
                    DEFAULT_HELIUS_MAINNET_URL,
                ),
                helius_devnet_url: env_or_default(HELIUS_DEVNET_URL_ENV, DEFAULT_HELIUS_DEVNET_URL),
                helius_api_key: env_optional(HELIUS_API_KEY_ENV),
                blockchain_info_url: env_or_default(
                    BLOCKCHAIN_INFO_URL_ENV,
                    DEFAULT_BLOCKCHAIN_INFO_URL,
                ),
                coingecko_api_url: env_or_default(COINGECKO_API_URL_ENV, DEFAULT_COINGECKO_API_URL),
            },
            stripe: StripeConfig {
                api_base_url: env_or_default(STRIPE_API_BASE_URL_ENV, DEFAULT_STRIPE_API_BASE_URL),
                secret_key: env_optional(STRIPE_SECRET_KEY_ENV),
                price_id: env_optional(STRIPE_PRICE_ID_ENV),
            },
            session_ttl: env_secs(SESSION_TTL_ENV).unwrap_or(DEFAULT_SESSION_TTL),
            session_sweep_interval: env_secs(SESSION_SWEEP_INTERVAL_ENV)
                .unwrap_or(DEFAULT_SESSION_SWEEP_INTERVAL),
            tls,
            log_format: LogFormat::parse(env_optional(LOG_FORMAT_ENV)),
        }
    }

    /// Path of the redb database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

impl Default for AppConfig {
    /// Local development defaults with no provider credentials.
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            public_app_url: None,
            indexers: IndexerConfig {
                zapper_api_url: DEFAULT_ZAPPER_API_URL.to_string(),
                zapper_api_key: None,
                helius_mainnet_url: DEFAULT_HELIUS_MAINNET_URL.to_string(),
                helius_devnet_url: DEFAULT_HELIUS_DEVNET_URL.to_string(),
                helius_api_key: None,
                blockchain_info_url: DEFAULT_BLOCKCHAIN_INFO_URL.to_string(),
                coingecko_api_url: DEFAULT_COINGECKO_API_URL.to_string(),
            },
            stripe: StripeConfig {
                api_base_url: DEFAULT_STRIPE_API_BASE_URL.to_string(),
                secret_key: None,
                price_id: None,
            },
            session_ttl: DEFAULT_SESSION_TTL,
            session_sweep_interval: DEFAULT_SESSION_SWEEP_INTERVAL,
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_optional(name)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
