use crate::api::cancellable::{CancellableRequest, RequestConfig};
use crate::api::error::GatewayError;
use crate::api::gateway::RequestGateway;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const SUPERSEDED_REASON: &str = "superseded by a newer request";

/// Runs requests where only the latest one matters, such as search-as-you-type.
/// Starting a new run cancels the one still in flight.
pub struct LiveQuery {
    gateway: RequestGateway,
    current: Mutex<Option<Arc<CancellableRequest>>>,
}

impl LiveQuery {
    pub fn new(gateway: RequestGateway) -> Self {
        Self {
            gateway,
            current: Mutex::new(None),
        }
    }

    pub async fn run(&self, config: RequestConfig) -> Result<Value, GatewayError> {
        let handle = Arc::new(self.gateway.create_cancellable_request());
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle.clone());

        if let Some(previous) = previous {
            debug!("Superseding in-flight request for {}", config.path);
            previous.cancel(SUPERSEDED_REASON);
        }

        handle.execute(config).await
    }

    /// Cancels whatever is in flight without starting anything new.
    pub fn cancel(&self, reason: impl Into<String>) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(current) = current {
            current.cancel(reason);
        }
    }
}
