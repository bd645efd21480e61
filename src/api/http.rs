//! HTTP implementation of the collaborator contracts.
//!
//! Talks to the coach backend's REST surface: `/plan`, `/chat`, `/review`,
//! `/roadmaps`, `/roadmap/{id}`, and the completion commit. All calls carry
//! the configured timeout; generation gets its own, longer one.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::chat::model::{ChatMessage, Role};
use crate::config::CoachConfig;
use crate::error::ApiError;
use crate::roadmap::generate::GenerationRequest;
use crate::roadmap::model::RoadmapSummary;

use super::traits::{
    Attachment, ChatApi, CoachReply, CompletionApi, GenerationApi, ReviewApi, ReviewReply,
    RoadmapStoreApi, StoredRoadmap,
};

/// Reqwest-backed implementation of every collaborator contract.
pub struct HttpApi {
    client: Client,
    base_url: String,
    generation_timeout: std::time::Duration,
    token: Option<SecretString>,
}

impl HttpApi {
    pub fn new(config: &CoachConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Request {
                endpoint: "client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generation_timeout: config.generation_timeout,
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| map_transport(endpoint, e))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            detail: detail_from_body(&body)
                .unwrap_or_else(|| "the server gave no detail".to_string()),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> Result<T, ApiError> {
        response.json().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl GenerationApi for HttpApi {
    async fn generate(&self, request: &GenerationRequest) -> Result<serde_json::Value, ApiError> {
        const ENDPOINT: &str = "/plan";

        let mut form = Form::new()
            .text("goal", request.goal.clone())
            .text("level", request.level.to_string())
            .text("duration", request.duration_weeks.to_string())
            .text("frequency", request.frequency.to_string());
        if let Some(doc) = &request.reference_document {
            let part = Part::bytes(doc.data.clone())
                .file_name(doc.filename.clone().unwrap_or_else(|| "reference".to_string()))
                .mime_str(&doc.mime_type)
                .map_err(|e| ApiError::Request {
                    endpoint: ENDPOINT.to_string(),
                    reason: format!("invalid attachment mime type: {e}"),
                })?;
            form = form.part("file", part);
        }

        let builder = self
            .authorize(self.client.post(self.url(ENDPOINT)))
            .timeout(self.generation_timeout)
            .multipart(form);
        let response = self.send(ENDPOINT, builder).await?;

        // The backend may stream the generated document; reassemble the
        // chunks into one JSON payload before parsing.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| map_transport(ENDPOINT, e))?;
            body.extend_from_slice(&chunk);
        }
        debug!(bytes = body.len(), "Reassembled generation payload");

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            endpoint: ENDPOINT.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn converse(
        &self,
        history: &[ChatMessage],
        context_hint: &str,
        roadmap_id: i64,
    ) -> Result<CoachReply, ApiError> {
        const ENDPOINT: &str = "/chat";

        let message = match history.last() {
            Some(last) if last.role == Role::User => last.text.clone(),
            _ => {
                return Err(ApiError::Request {
                    endpoint: ENDPOINT.to_string(),
                    reason: "chat history must end with a user message".to_string(),
                });
            }
        };

        let builder = self
            .authorize(self.client.post(self.url(ENDPOINT)))
            .json(&json!({
                "history": history,
                "context": context_hint,
                "message": message,
                "roadmap_id": roadmap_id,
            }));
        let response = self.send(ENDPOINT, builder).await?;
        Self::decode(ENDPOINT, response).await
    }
}

#[async_trait]
impl ReviewApi for HttpApi {
    async fn review(
        &self,
        attachment: &Attachment,
        prompt: &str,
    ) -> Result<ReviewReply, ApiError> {
        const ENDPOINT: &str = "/review";

        let builder = self
            .authorize(self.client.post(self.url(ENDPOINT)))
            .json(&json!({
                "base64Image": attachment.to_base64(),
                "mimeType": attachment.mime_type,
                "prompt": prompt,
            }));
        let response = self.send(ENDPOINT, builder).await?;
        Self::decode(ENDPOINT, response).await
    }
}

#[async_trait]
impl CompletionApi for HttpApi {
    async fn commit(&self, roadmap_id: i64, mission_id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/roadmap/{roadmap_id}/mission/{mission_id}/complete");
        let builder = self.authorize(self.client.put(self.url(&endpoint)));
        self.send(&endpoint, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl RoadmapStoreApi for HttpApi {
    async fn list(&self) -> Result<Vec<RoadmapSummary>, ApiError> {
        const ENDPOINT: &str = "/roadmaps";
        let builder = self.authorize(self.client.get(self.url(ENDPOINT)));
        let response = self.send(ENDPOINT, builder).await?;
        Self::decode(ENDPOINT, response).await
    }

    async fn get(&self, id: i64) -> Result<StoredRoadmap, ApiError> {
        let endpoint = format!("/roadmap/{id}");
        let builder = self.authorize(self.client.get(self.url(&endpoint)));
        let response = self.send(&endpoint, builder).await?;
        Self::decode(&endpoint, response).await
    }
}

fn map_transport(endpoint: &str, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        ApiError::Request {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Pull the `detail` field out of an error body, falling back to the raw
/// text when it is not the backend's usual `{"detail": ...}` shape.
fn detail_from_body(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return Some(detail.to_string());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
