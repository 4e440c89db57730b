use async_trait::async_trait;

use crate::Result;

/// One text query against an NLU agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NluQuery {
    pub project_id: String,
    pub session_id: String,
    pub text: String,
    pub language_code: String,
}

/// What the agent answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NluResponse {
    /// Reply text to send back to the user. May be empty.
    pub fulfillment_text: String,
    /// Matched intent action, if the agent defines one.
    pub action: Option<String>,
}

/// Turns user text into a fulfillment reply.
#[async_trait]
pub trait NluClient: Send + Sync {
    /// Detect the intent behind `query.text`.
    ///
    /// Fails with [`crate::Error::EmptySession`] when the project or session
    /// id is empty; no request is made in that case.
    async fn detect_intent(&self, query: &NluQuery) -> Result<NluResponse>;
}
