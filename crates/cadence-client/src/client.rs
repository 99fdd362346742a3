//! HTTP client for the scheduling service.

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::config::DashboardConfig;
use cadence_core::error::{CadenceError, CadenceResult, ErrorCode};
use cadence_core::traits::{RetrainStatus, ScheduleService, ScheduleUpdate};
use cadence_core::types::{DueList, Performance, Recommendation, SubjectTree, Topic, TopicId};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

/// Client for the scheduling service's `/api` routes.
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    client: Client,
    base_url: Url,
}

impl ScheduleClient {
    /// Create a client for the given base URL with no request timeout.
    pub fn new(base_url: &str) -> CadenceResult<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a client with options.
    pub fn with_options(base_url: &str, timeout: Option<Duration>) -> CadenceResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CadenceError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Create a client from dashboard configuration.
    pub fn from_config(config: &DashboardConfig) -> CadenceResult<Self> {
        Self::with_options(&config.base_url, config.request_timeout())
    }

    /// Create a client from `CADENCE_*` environment variables.
    pub fn from_env() -> CadenceResult<Self> {
        Self::from_config(&DashboardConfig::from_env()?)
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> CadenceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CadenceError::Configuration(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Send a request; non-2xx answers become service errors.
    ///
    /// The message is the body's `error` field, then `detail`, then `fallback`.
    async fn send(&self, request: RequestBuilder, fallback: &str) -> CadenceResult<Response> {
        let response = request.send().await.map_err(|e| transport_error(e, fallback))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
        debug!(status = status.as_u16(), %message, "Service rejected request");
        Err(CadenceError::from_http_status(status.as_u16(), message))
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> CadenceResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, what))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CadenceError::malformed(format!("Failed to parse {}: {}", what, e)))
    }
}

fn parse_base_url(raw: &str) -> CadenceResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
        .map_err(|e| CadenceError::Configuration(format!("Invalid base URL '{}': {}", raw, e)))
}

fn transport_error(e: reqwest::Error, context: &str) -> CadenceError {
    let code = if e.is_timeout() {
        ErrorCode::NetTimeout
    } else {
        ErrorCode::NetConnectionFailed
    };
    CadenceError::Network {
        message: format!("{}: {}", context, e),
        code,
        source: Some(Box::new(e)),
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "detail"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Numeric ids go back as JSON numbers, everything else as strings.
fn wire_id(id: &TopicId) -> Value {
    match id.as_str().parse::<u64>() {
        Ok(n) if n.to_string() == id.as_str() => json!(n),
        _ => json!(id.as_str()),
    }
}

#[async_trait]
impl ScheduleService for ScheduleClient {
    async fn fetch_subjects(&self) -> CadenceResult<SubjectTree> {
        debug!("Fetching subjects");
        let response = self
            .send(self.client.get(self.endpoint("api/subjects")?), "Failed to load subjects")
            .await?;
        Self::parse(response, "subjects").await
    }

    async fn fetch_recommendations(&self) -> CadenceResult<Vec<Recommendation>> {
        debug!("Fetching recommendations");
        let response = self
            .send(
                self.client.get(self.endpoint("api/recommendations")?),
                "Failed to load recommendations",
            )
            .await?;
        Self::parse::<DueList>(response, "recommendations")
            .await
            .map(DueList::into_inner)
    }

    async fn schedule(
        &self,
        topic_id: &TopicId,
        performance: Performance,
    ) -> CadenceResult<ScheduleUpdate> {
        debug!(%topic_id, performance = performance.value(), "Posting schedule update");
        let body = json!({
            "topicId": wire_id(topic_id),
            "performance": performance.value(),
        });
        let response = self
            .send(
                self.client.post(self.endpoint("api/schedule")?).json(&body),
                "Failed to update performance",
            )
            .await?;
        Self::parse(response, "schedule response").await
    }

    async fn create_subject(&self, name: &str) -> CadenceResult<()> {
        debug!(subject = name, "Creating subject");
        self.send(
            self.client
                .post(self.endpoint("api/subjects")?)
                .json(&json!({ "name": name })),
            "Failed to add subject",
        )
        .await?;
        Ok(())
    }

    async fn create_subskill(&self, subject: &str, name: &str) -> CadenceResult<()> {
        debug!(subject, subskill = name, "Creating subskill");
        self.send(
            self.client
                .post(self.endpoint("api/subskills")?)
                .json(&json!({ "subject": subject, "name": name })),
            "Failed to add subskill",
        )
        .await?;
        Ok(())
    }

    async fn create_topic(&self, subject: &str, subskill: &str, name: &str) -> CadenceResult<Topic> {
        debug!(subject, subskill, topic = name, "Creating topic");
        let response = self
            .send(
                self.client
                    .post(self.endpoint("api/topics")?)
                    .json(&json!({ "subject": subject, "subskill": subskill, "name": name })),
                "Failed to add topic",
            )
            .await?;
        let mut topic: Topic = Self::parse(response, "created topic").await?;
        if topic.name.is_empty() {
            topic.name = name.to_string();
        }
        Ok(topic)
    }

    async fn retrain(&self) -> CadenceResult<RetrainStatus> {
        debug!("Requesting retrain");
        let response = self
            .send(
                self.client.post(self.endpoint("api/retrain")?),
                "Failed to retrain model",
            )
            .await?;
        Self::parse(response, "retrain status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ScheduleClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
        assert_eq!(
            client.endpoint("api/schedule").unwrap().as_str(),
            "http://localhost:5000/api/schedule"
        );

        let nested = ScheduleClient::new("http://host/tracker/").unwrap();
        assert_eq!(
            nested.endpoint("api/subjects").unwrap().as_str(),
            "http://host/tracker/api/subjects"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ScheduleClient::new("not a url").unwrap_err();
        assert!(matches!(err, CadenceError::Configuration(_)));
    }

    #[test]
    fn test_error_message_precedence() {
        assert_eq!(
            error_message(r#"{"error": "Topic not found", "detail": "x"}"#).as_deref(),
            Some("Topic not found")
        );
        assert_eq!(error_message(r#"{"detail": "Bad path"}"#).as_deref(), Some("Bad path"));
        assert_eq!(error_message(r#"{"error": "  "}"#), None);
        assert_eq!(error_message(r#"{"status": "No user data"}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_wire_id() {
        assert_eq!(wire_id(&TopicId::from(42)), json!(42));
        assert_eq!(wire_id(&TopicId::parse("math:algebra").unwrap()), json!("math:algebra"));
        assert_eq!(wire_id(&TopicId::parse("007").unwrap()), json!("007"));
    }
}
