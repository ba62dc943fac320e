pub mod api;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use api::cancellable::{CancellableRequest, RequestConfig};
pub use api::error::GatewayError;
pub use api::gateway::RequestGateway;
pub use models::cache::{QueryParams, ResponseCache};
pub use models::config::{Environment, GatewayConfig};
pub use services::conference_service::ConferenceService;
pub use services::live_query::LiveQuery;
