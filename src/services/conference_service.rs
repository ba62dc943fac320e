use crate::api::error::GatewayError;
use crate::api::gateway::RequestGateway;
use crate::models::cache::QueryParams;
use reqwest::Url;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

const PARTICIPANTS: &str = "/api/participants";

/// Typed call sites for the conference backend.
///
/// Reads go through the gateway cache except for `stats`, which is always
/// fetched fresh. Writes drop the cached reads they make stale.
pub struct ConferenceService {
    gateway: RequestGateway,
}

impl ConferenceService {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    async fn cached(&self, path: &str) -> Result<Value, GatewayError> {
        self.gateway.get(path, &QueryParams::new(), true).await
    }

    pub async fn participants(&self) -> Result<Value, GatewayError> {
        self.cached(PARTICIPANTS).await
    }

    pub async fn participant(&self, id: u64) -> Result<Value, GatewayError> {
        self.cached(&participant_path(id)).await
    }

    pub async fn programs(&self) -> Result<Value, GatewayError> {
        self.cached("/api/programs").await
    }

    pub async fn notifications(&self) -> Result<Value, GatewayError> {
        self.cached("/api/notifications").await
    }

    pub async fn stats(&self) -> Result<Value, GatewayError> {
        self.gateway.get("/api/stats", &QueryParams::new(), false).await
    }

    pub async fn participant_dashboard(&self, email: &str) -> Result<Value, GatewayError> {
        self.cached(&dashboard_path(email)).await
    }

    pub async fn add_participant<T: Serialize>(&self, participant: &T) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(participant)?;
        let created = self.gateway.post(PARTICIPANTS, &body).await?;
        info!("Participant added");
        self.invalidate_participants(None);
        Ok(created)
    }

    pub async fn register<T: Serialize>(&self, registration: &T) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(registration)?;
        let registered = self.gateway.post("/api/register", &body).await?;
        self.invalidate_participants(None);
        Ok(registered)
    }

    pub async fn update_participant<T: Serialize>(&self, id: u64, changes: &T) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(changes)?;
        let updated = self.gateway.put(&participant_path(id), &body).await?;
        self.invalidate_participants(Some(id));
        Ok(updated)
    }

    pub async fn remove_participant(&self, id: u64) -> Result<Value, GatewayError> {
        let removed = self.gateway.delete(&participant_path(id)).await?;
        self.invalidate_participants(Some(id));
        Ok(removed)
    }

    pub async fn send_certificate(&self, participant_id: u64) -> Result<Value, GatewayError> {
        let path = format!("/api/send-certificate/{}", participant_id);
        match self.gateway.post(&path, &json!({})).await {
            Ok(sent) => {
                info!("Certificate sent to participant {}", participant_id);
                self.invalidate_participants(Some(participant_id));
                Ok(sent)
            }
            Err(e) => {
                error!("Error sending certificate to {}: {}", participant_id, e);
                Err(e)
            }
        }
    }

    pub async fn send_all_certificates(&self) -> Result<Value, GatewayError> {
        let sent = self.gateway.post("/api/send-all-certificates", &json!({})).await?;
        info!("All certificates sent");
        self.invalidate_participants(None);
        Ok(sent)
    }

    pub async fn trigger_program_reminders(&self) -> Result<Value, GatewayError> {
        self.gateway.post("/api/programs/reminders/trigger", &json!({})).await
    }

    fn invalidate_participants(&self, id: Option<u64>) {
        self.gateway.clear_cache(Some(PARTICIPANTS), None);
        if let Some(id) = id {
            self.gateway.clear_cache(Some(&participant_path(id)), None);
        }
    }
}

fn participant_path(id: u64) -> String {
    format!("{}/{}", PARTICIPANTS, id)
}

fn dashboard_path(email: &str) -> String {
    format!("{}/{}/dashboard", PARTICIPANTS, encode_segment(email))
}

/// Percent-encodes `segment` so that `/`, `?` and `#` stay inside one path
/// segment.
fn encode_segment(segment: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return segment.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}
