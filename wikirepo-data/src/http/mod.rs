//! [`EntityStore`] backed by Wikidata's `Special:EntityData` endpoint.
//!
//! The store trait is synchronous so the query engine stays embeddable in
//! synchronous code. Requests run on a Tokio runtime owned by the store, or
//! on the caller's multi-threaded runtime via
//! [`tokio::task::block_in_place`]. A `current_thread` runtime cannot be
//! blocked on, so fetches made from inside one fail with
//! [`StoreError::Transport`].
//!
//! # Example
//!
//! ```no_run
//! use wikirepo_core::{EntityCache, EntityId};
//! use wikirepo_data::HttpEntityStore;
//!
//! let mut cache = EntityCache::new(HttpEntityStore::new("https://www.wikidata.org")?);
//! let label = cache.label(EntityId::item(183))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;
use wikirepo_core::{Entity, EntityId, EntityStore, StoreError};

use crate::parse_entity_document;

/// Default user agent for entity requests.
pub const DEFAULT_USER_AGENT: &str = "wikirepo/0.1";

/// Default Wikidata host.
pub const DEFAULT_BASE_URL: &str = "https://www.wikidata.org";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing an [`HttpEntityStore`].
#[derive(Debug, Error)]
pub enum StoreBuildError {
    /// The base URL does not parse or cannot carry a path.
    #[error("invalid base URL '{base_url}': {reason}")]
    BaseUrl {
        /// Configured base URL.
        base_url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        /// Client builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {source}")]
    Runtime {
        /// Runtime builder failure.
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for [`HttpEntityStore`].
#[derive(Debug, Clone)]
pub struct HttpEntityStoreConfig {
    /// Wikidata host, e.g. `"https://www.wikidata.org"`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpEntityStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpEntityStoreConfig {
    /// Configuration for `base_url` with default timeout and user agent.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Entity store fetching `{base}/wiki/Special:EntityData/{id}.json`.
///
/// A 404 response maps to [`StoreError::NotFound`], other transport and
/// status failures to [`StoreError::Transport`], and undecodable bodies to
/// [`StoreError::Malformed`].
///
/// Called outside any Tokio runtime, the store blocks on its own runtime.
/// Inside a multi-threaded runtime it borrows the caller's handle through
/// `block_in_place`. Inside a `current_thread` runtime neither is possible
/// and the fetch returns [`StoreError::Transport`] without sending a request.
pub struct HttpEntityStore {
    client: Client,
    config: HttpEntityStoreConfig,
    base: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEntityStore")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpEntityStore {
    /// Store for `base_url` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreBuildError> {
        Self::with_config(HttpEntityStoreConfig::new(base_url))
    }

    /// Store with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpEntityStoreConfig) -> Result<Self, StoreBuildError> {
        let base = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|source| StoreBuildError::HttpClient { source })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| StoreBuildError::Runtime { source })?;
        Ok(Self {
            client,
            config,
            base,
            runtime,
        })
    }

    /// Configuration the store was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpEntityStoreConfig {
        &self.config
    }

    /// Document URL for `id`.
    #[must_use]
    pub fn entity_url(&self, id: EntityId) -> String {
        format!(
            "{}/wiki/Special:EntityData/{id}.json",
            self.base.as_str().trim_end_matches('/')
        )
    }

    async fn fetch_async(&self, id: EntityId) -> Result<Entity, StoreError> {
        let url = self.entity_url(id);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(id, &err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { id });
        }
        let body = response
            .error_for_status()
            .map_err(|err| transport_error(id, &err))?
            .bytes()
            .await
            .map_err(|err| transport_error(id, &err))?;
        let mut bytes = body.to_vec();
        parse_entity_document(id, &mut bytes).map_err(|err| err.into_store_error(id))
    }
}

impl EntityStore for HttpEntityStore {
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.fetch_async(id)))
            }
            Ok(_) => Err(StoreError::Transport {
                id,
                message: "cannot block inside a current_thread Tokio runtime; fetch from a \
                          multi-threaded runtime or outside any runtime"
                    .to_owned(),
            }),
            Err(_) => self.runtime.block_on(self.fetch_async(id)),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, StoreBuildError> {
    let rejected = |reason: String| StoreBuildError::BaseUrl {
        base_url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|err| rejected(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(rejected("URL cannot carry a path".to_owned()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(rejected(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

fn transport_error(id: EntityId, error: &reqwest::Error) -> StoreError {
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    };
    StoreError::Transport { id, message }
}
