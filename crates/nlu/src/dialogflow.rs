//! Dialogflow v2 `detectIntent` over REST.

use std::time::Instant;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use yuta_config::NluConfig;

use crate::{
    client::{NluClient, NluQuery, NluResponse},
    error::{Error, Result},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest<'a> {
    query_input: QueryInput<'a>,
}

#[derive(Serialize)]
struct QueryInput<'a> {
    text: TextInput<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextInput<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    #[serde(default)]
    query_result: Option<QueryResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    fulfillment_text: String,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// REST client for one Dialogflow endpoint.
pub struct DialogflowClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<Secret<String>>,
}

impl DialogflowClient {
    pub fn new(endpoint: impl Into<String>, access_token: Option<Secret<String>>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, access_token)
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: Option<Secret<String>>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Build a client from the shared `nlu` config section.
    pub fn from_config(config: &NluConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(
            http,
            config.endpoint.clone(),
            config.access_token().map(|t| Secret::new(t.to_string())),
        ))
    }

    fn detect_intent_url(&self, project_id: &str, session_id: &str) -> String {
        format!(
            "{}/v2/projects/{}/agent/sessions/{}:detectIntent",
            self.endpoint,
            urlencoding::encode(project_id),
            urlencoding::encode(session_id),
        )
    }
}

#[async_trait]
impl NluClient for DialogflowClient {
    async fn detect_intent(&self, query: &NluQuery) -> Result<NluResponse> {
        if query.project_id.is_empty() || query.session_id.is_empty() {
            return Err(Error::EmptySession {
                project_id: query.project_id.clone(),
                session_id: query.session_id.clone(),
            });
        }

        let url = self.detect_intent_url(&query.project_id, &query.session_id);
        let body = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text: &query.text,
                    language_code: &query.language_code,
                },
            },
        };

        let mut req = self.http.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token.expose_secret());
        }

        let started = Instant::now();
        let result = send(req).await;

        #[cfg(feature = "metrics")]
        {
            use yuta_metrics::{counter, histogram, labels, nlu};
            counter!(nlu::QUERIES_TOTAL).increment(1);
            histogram!(nlu::QUERY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
            if let Err(e) = &result {
                counter!(nlu::QUERY_ERRORS_TOTAL, labels::ERROR_TYPE => e.kind()).increment(1);
            }
        }

        match &result {
            Ok(resp) => debug!(
                project_id = query.project_id,
                action = ?resp.action,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "dialogflow intent detected"
            ),
            Err(e) => warn!(project_id = query.project_id, error = %e, "dialogflow query failed"),
        }
        result
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<NluResponse> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<GoogleErrorBody>(&text) {
            Ok(body) if !body.error.status.is_empty() => {
                format!("{}: {}", body.error.status, body.error.message)
            },
            Ok(body) => body.error.message,
            Err(_) => text,
        };
        return Err(Error::Service {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: DetectIntentResponse = resp.json().await?;
    let result = parsed.query_result.unwrap_or(QueryResult {
        fulfillment_text: String::new(),
        action: None,
    });
    Ok(NluResponse {
        fulfillment_text: result.fulfillment_text,
        action: result.action.filter(|a| !a.is_empty()),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_camel_case() {
        let body = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text: "hello",
                    language_code: "en-US",
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"queryInput": {"text": {"text": "hello", "languageCode": "en-US"}}})
        );
    }

    #[test]
    fn session_path_is_encoded() {
        let client = DialogflowClient::new("https://dialogflow.googleapis.com/", None);
        assert_eq!(
            client.detect_intent_url("yuta-seig", "room 1"),
            "https://dialogflow.googleapis.com/v2/projects/yuta-seig/agent/sessions/room%201:detectIntent"
        );
    }

    #[tokio::test]
    async fn empty_ids_fail_without_request() {
        let client = DialogflowClient::new("http://127.0.0.1:9", None);
        let query = NluQuery {
            project_id: String::new(),
            session_id: "test".into(),
            text: "hello".into(),
            language_code: "en-US".into(),
        };
        let err = client.detect_intent(&query).await.unwrap_err();
        assert!(matches!(err, Error::EmptySession { .. }));
        assert_eq!(err.to_string(), "received empty project () or session (test)");
    }
}
