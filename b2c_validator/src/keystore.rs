//! Acquisition and caching of the tenant's signing keys

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use b2c_jose::clock::UnixTime;
use b2c_jose::Jwks;
use reqwest::header;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::ValidatorConfig;
use crate::error::{FetchFailure, KeyStoreError};

const USER_AGENT: &str = concat!("b2c_validator/", env!("CARGO_PKG_VERSION"));

/// How long a single fetch may take before it is abandoned
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The subset of the OpenID Connect metadata document the validator reads
#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    #[serde(default)]
    jwks_uri: Option<String>,
}

/// A fetched key set and the moment it was fetched
#[derive(Debug)]
pub(crate) struct CachedKeys {
    pub(crate) jwks: Jwks,
    fetched_at: UnixTime,
}

/// Lazily fetches and caches the signing keys for one tenant and policy
///
/// A key set is fresh while `now - fetched_at` is under the configured
/// expiry; the next caller after that refetches. Refreshes are
/// single-flight: one fetch is in flight per store at a time, and waiters
/// reuse its result. A failed refresh propagates its error and leaves any
/// previously cached key set in place for later calls — it is not used to
/// satisfy the failing call.
#[derive(Debug)]
pub(crate) struct KeyStore {
    client: reqwest::Client,
    metadata_url: String,
    expiry: Duration,
    keys: ArcSwapOption<CachedKeys>,
    refresh: Mutex<()>,
}

impl KeyStore {
    pub(crate) fn new(config: &ValidatorConfig) -> Self {
        Self {
            client: reqwest::Client::default(),
            metadata_url: config.metadata_url(),
            expiry: config.key_expiry(),
            keys: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the current signing keys, refreshing them when stale
    pub(crate) async fn signing_keys(
        &self,
        now: UnixTime,
    ) -> Result<Arc<CachedKeys>, KeyStoreError> {
        if let Some(cached) = self.keys.load_full() {
            if self.is_fresh(&cached, now) {
                return Ok(cached);
            }
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have finished the refresh while this one
        // waited on the lock.
        if let Some(cached) = self.keys.load_full() {
            if self.is_fresh(&cached, now) {
                return Ok(cached);
            }
        }

        let jwks = self.fetch_keys().await?;
        let cached = Arc::new(CachedKeys {
            jwks,
            fetched_at: now,
        });
        self.keys.store(Some(Arc::clone(&cached)));

        Ok(cached)
    }

    fn is_fresh(&self, cached: &CachedKeys, now: UnixTime) -> bool {
        now.0.saturating_sub(cached.fetched_at.0) < self.expiry.as_secs()
    }

    #[tracing::instrument(skip(self), fields(metadata.url = %self.metadata_url))]
    async fn fetch_keys(&self) -> Result<Jwks, KeyStoreError> {
        tracing::debug!("refreshing signing keys");

        let metadata = self.fetch_metadata().await?;
        let jwks_uri = metadata.jwks_uri.ok_or(KeyStoreError::JwksUriMissing)?;

        let body = self
            .get_text(&jwks_uri)
            .await
            .map_err(|err| err.or_fetch_failed(KeyStoreError::CertsFetchFailed))?;

        let jwks: Jwks = serde_json::from_str(&body).map_err(KeyStoreError::BadKeySetFormat)?;

        tracing::info!(jwks.url = %jwks_uri, "signing keys refreshed");

        Ok(jwks)
    }

    async fn fetch_metadata(&self) -> Result<ProviderMetadata, KeyStoreError> {
        let body = self
            .get_text(&self.metadata_url)
            .await
            .map_err(|err| err.or_fetch_failed(KeyStoreError::ConfigFetchFailed))?;

        serde_json::from_str(&body)
            .map_err(|err| KeyStoreError::ConfigFetchFailed(FetchFailure::Parse(err)))
    }

    async fn get_text(&self, url: &str) -> Result<String, GetError> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                http.url = url,
                http.status_code = status.as_u16(),
                "unexpected response status"
            );
            return Err(GetError::Failure(FetchFailure::Status(status)));
        }

        response.text().await.map_err(classify_transport)
    }
}

enum GetError {
    Timeout(reqwest::Error),
    Failure(FetchFailure),
}

impl GetError {
    fn or_fetch_failed(self, wrap: fn(FetchFailure) -> KeyStoreError) -> KeyStoreError {
        match self {
            Self::Timeout(err) => KeyStoreError::RequestTimeout(err),
            Self::Failure(failure) => wrap(failure),
        }
    }
}

fn classify_transport(err: reqwest::Error) -> GetError {
    if err.is_timeout() {
        GetError::Timeout(err)
    } else {
        GetError::Failure(FetchFailure::Transport(err))
    }
}
