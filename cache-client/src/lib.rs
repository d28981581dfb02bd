//! Minimal blocking client for the cache's HTTP/JSON surface
//!
//! This is a thin wrapper for tests and manual probing against a running
//! `cache-server`, not a general-purpose load generator: one blocking
//! `reqwest::blocking::Client` call per method, no connection pooling
//! tuning, no retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP request itself failed (connection refused, timeout, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server responded with WRONGTYPE or another 4xx error body
    #[error("server error: {0}")]
    Server(String),
}

type Result<T> = std::result::Result<T, ClientError>;

/// A blocking client bound to one `cache-server` base URL
pub struct CacheClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl CacheClient {
    /// Creates a client targeting `base_url`, e.g. `http://127.0.0.1:7379`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::blocking::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        if response.status().is_client_error() {
            let body: ErrorBody = response.json()?;
            return Err(ClientError::Server(body.error));
        }
        Ok(response)
    }

    /// `GET /health`
    pub fn health(&self) -> Result<bool> {
        #[derive(Deserialize)]
        struct HealthBody {
            ok: bool,
        }
        let response = self.http.get(self.url("/health")).send()?;
        let body: HealthBody = Self::check_status(response)?.json()?;
        Ok(body.ok)
    }

    /// `POST /set`
    pub fn set(&self, key: &str, value: &str, px: Option<u64>) -> Result<()> {
        #[derive(Serialize)]
        struct Req<'a> {
            key: &'a str,
            value: &'a str,
            px: Option<u64>,
        }
        let response = self.http.post(self.url("/set")).json(&Req { key, value, px }).send()?;
        Self::check_status(response)?;
        Ok(())
    }

    /// `GET /get`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct Resp {
            value: Option<String>,
        }
        let response = self.http.get(self.url("/get")).query(&[("key", key)]).send()?;
        let body: Resp = Self::check_status(response)?.json()?;
        Ok(body.value)
    }

    /// `POST /del`
    pub fn del(&self, key: &str) -> Result<u64> {
        #[derive(Serialize)]
        struct Req<'a> {
            key: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            deleted: u64,
        }
        let response = self.http.post(self.url("/del")).json(&Req { key }).send()?;
        let body: Resp = Self::check_status(response)?.json()?;
        Ok(body.deleted)
    }

    /// `POST /zadd`
    pub fn zadd(&self, key: &str, score: f64, member: &str) -> Result<u64> {
        #[derive(Serialize)]
        struct Req<'a> {
            key: &'a str,
            score: f64,
            member: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            added: u64,
        }
        let response = self.http.post(self.url("/zadd")).json(&Req { key, score, member }).send()?;
        let body: Resp = Self::check_status(response)?.json()?;
        Ok(body.added)
    }

    /// `GET /zrangeByScore`
    pub fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        limit: Option<usize>,
    ) -> Result<Vec<(String, f64)>> {
        #[derive(Deserialize)]
        struct Resp {
            items: Vec<(String, f64)>,
        }
        let mut query = vec![
            ("key".to_string(), key.to_string()),
            ("min".to_string(), min.to_string()),
            ("max".to_string(), max.to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        let response = self.http.get(self.url("/zrangeByScore")).query(&query).send()?;
        let body: Resp = Self::check_status(response)?.json()?;
        Ok(body.items)
    }

    /// `GET /stats`
    pub fn stats(&self) -> Result<StatsBody> {
        let response = self.http.get(self.url("/stats")).send()?;
        let body: StatsBody = Self::check_status(response)?.json()?;
        Ok(body)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Mirrors `cache_engine::coordinator::StatsSnapshot`, decoded from `/stats`
#[derive(Debug, Clone, Deserialize)]
pub struct StatsBody {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub operations: u64,
    pub key_count: usize,
    pub memory_used: usize,
    pub hit_rate: f64,
}
