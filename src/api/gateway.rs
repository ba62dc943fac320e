use crate::api::cancellable::{CancellableRequest, RequestConfig};
use crate::api::error::{parse_body, GatewayError};
use crate::models::cache::{cache_key, QueryParams, ResponseCache, SHARED_CACHE};
use crate::models::config::GatewayConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Query parameter added to every GET so intermediaries never answer from
/// their own caches.
pub const CACHE_BUSTER_PARAM: &str = "_t";

static LAST_CACHE_BUSTER: AtomicU64 = AtomicU64::new(0);

/// Current time in milliseconds since the epoch, bumped so that no two calls
/// in this process ever return the same value.
pub fn next_cache_buster() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let mut previous = LAST_CACHE_BUSTER.load(Ordering::Relaxed);
    loop {
        let next = now.max(previous + 1);
        match LAST_CACHE_BUSTER.compare_exchange_weak(previous, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

/// The single path from callers to the backend API.
///
/// GETs go through an application-level response cache; POST, PUT and DELETE
/// never touch it. Writes do not invalidate cached reads: callers that need
/// fresh data after a write call [`RequestGateway::clear_cache`] themselves.
#[derive(Clone, Debug)]
pub struct RequestGateway {
    client: Client,
    base_url: String,
    cache: Arc<ResponseCache>,
}

impl RequestGateway {
    /// Creates a gateway backed by the process-wide [`SHARED_CACHE`], so every
    /// gateway built this way sees the same cached responses.
    ///
    /// The shared cache keeps the TTL it was created with
    /// (`CONFERENCE_CACHE_TTL_SECS`); `config.cache_ttl` is not applied. Use
    /// [`RequestGateway::isolated`] for a cache with a different TTL.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        if config.cache_ttl != SHARED_CACHE.ttl() {
            warn!(
                "Ignoring cache ttl {:?}: the shared cache uses {:?}",
                config.cache_ttl,
                SHARED_CACHE.ttl()
            );
        }
        Self::with_cache(config, SHARED_CACHE.clone())
    }

    /// Creates a gateway with its own cache, using `config.cache_ttl`.
    pub fn isolated(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_cache(config, Arc::new(ResponseCache::new(config.cache_ttl)))
    }

    pub fn with_cache(config: &GatewayConfig, cache: Arc<ResponseCache>) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        info!(
            "Request gateway for {} ({}), timeout {:?}, cache ttl {:?}",
            config.base_url,
            config.environment,
            config.timeout,
            cache.ttl()
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// GET `path` with `params`.
    ///
    /// With `use_cache`, a fresh cached payload is returned without a network
    /// call, and a successful response is stored under the key built from
    /// `path` and `params` (the cache-busting stamp is not part of it). Without
    /// `use_cache` the cache is neither read nor written.
    pub async fn get(&self, path: &str, params: &QueryParams, use_cache: bool) -> Result<Value, GatewayError> {
        let key = cache_key(path, params);

        if use_cache {
            if let Some(data) = self.cache.get(&key) {
                return Ok(data);
            }
            debug!("Cache miss for {}", key);
        }

        let data = self.dispatch(self.request(Method::GET, path, params)).await?;

        if use_cache {
            self.cache.insert(key, data.clone());
        }

        Ok(data)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, GatewayError> {
        let builder = self.request(Method::POST, path, &QueryParams::new()).json(body);
        self.dispatch(builder).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, GatewayError> {
        let builder = self.request(Method::PUT, path, &QueryParams::new()).json(body);
        self.dispatch(builder).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, GatewayError> {
        self.dispatch(self.request(Method::DELETE, path, &QueryParams::new())).await
    }

    /// Evicts the entry for `path` and `params` (no params meaning the empty
    /// set), or everything when `path` is `None`.
    pub fn clear_cache(&self, path: Option<&str>, params: Option<&QueryParams>) {
        match path {
            Some(path) => {
                let empty = QueryParams::new();
                let key = cache_key(path, params.unwrap_or(&empty));
                if self.cache.remove(&key) {
                    debug!("Cleared cache entry for {}", key);
                }
            }
            None => {
                debug!("Clearing all {} cache entries", self.cache.len());
                self.cache.clear();
            }
        }
    }

    /// Issues an arbitrary request without consulting the cache.
    pub async fn send_request(&self, config: &RequestConfig) -> Result<Value, GatewayError> {
        let mut builder = self.request(config.method.clone(), &config.path, &config.params);
        if let Some(body) = &config.body {
            builder = builder.json(body);
        }
        self.dispatch(builder).await
    }

    pub fn create_cancellable_request(&self) -> CancellableRequest {
        CancellableRequest::new(self.clone())
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str, params: &QueryParams) -> RequestBuilder {
        let stamp = (method == Method::GET).then(next_cache_buster);
        let mut builder = self.client.request(method, self.url(path));
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(stamp) = stamp {
            builder = builder.query(&[(CACHE_BUSTER_PARAM, stamp)]);
        }
        builder
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Value, GatewayError> {
        let response = builder.send().await.map_err(GatewayError::from_transport)?;
        let status = response.status();
        debug!("{} from {}", status, response.url().path());

        let text = response.text().await.map_err(GatewayError::from_transport)?;
        let body = parse_body(&text);

        if status.is_success() {
            Ok(body)
        } else {
            Err(GatewayError::from_response(status, body))
        }
    }
}
