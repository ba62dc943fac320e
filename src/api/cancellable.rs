use crate::api::error::GatewayError;
use crate::api::gateway::RequestGateway;
use crate::models::cache::QueryParams;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

pub const DEFAULT_CANCEL_REASON: &str = "Request cancelled";

/// Description of a request issued through [`RequestGateway::send_request`]
/// or a [`CancellableRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: Method,
    pub path: String,
    pub params: QueryParams,
    pub body: Option<Value>,
}

impl RequestConfig {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: QueryParams::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A request handle bound to its own cancellation signal.
///
/// Cancelling only detaches the caller from the in-flight call: the pending
/// `execute` settles as [`GatewayError::Cancelled`] and the response, if it
/// still arrives, is dropped. Once cancelled, the handle stays cancelled.
#[derive(Debug)]
pub struct CancellableRequest {
    gateway: RequestGateway,
    cancel_tx: watch::Sender<Option<String>>,
}

impl CancellableRequest {
    pub(crate) fn new(gateway: RequestGateway) -> Self {
        let (cancel_tx, _) = watch::channel(None);
        Self { gateway, cancel_tx }
    }

    pub async fn execute(&self, config: RequestConfig) -> Result<Value, GatewayError> {
        let mut cancelled = self.cancel_tx.subscribe();

        tokio::select! {
            biased;
            reason = cancelled.wait_for(Option::is_some) => {
                let reason = match reason {
                    Ok(reason) => reason.as_deref().unwrap_or(DEFAULT_CANCEL_REASON).to_string(),
                    Err(_) => DEFAULT_CANCEL_REASON.to_string(),
                };
                debug!("{} {} cancelled: {}", config.method, config.path, reason);
                Err(GatewayError::Cancelled(reason))
            }
            result = self.gateway.send_request(&config) => result,
        }
    }

    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel_tx.send_replace(Some(reason.into()));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_tx.borrow().is_some()
    }
}
