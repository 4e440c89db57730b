use std::sync::Arc;

use {async_trait::async_trait, tokio_util::sync::CancellationToken};

use yuta_config::{ClientConfig, ClientType};

use crate::{Result, event::InboundReceiver};

/// An authenticated, live connection to one chat account.
///
/// Credentials obtained at login are kept by the session and reused for every
/// call, so nothing here re-authenticates.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Identifier used in logs and metric labels (`username@host`).
    fn account_id(&self) -> &str;

    /// Platform identity of the logged-in account, e.g. `@yuta:example.org`.
    fn user_id(&self) -> &str;

    /// Start delivering inbound events.
    ///
    /// Events arrive on the returned receiver in the order the server
    /// delivers them. The stream ends once `cancel` fires or the session hits
    /// an unrecoverable transport error.
    async fn subscribe(&self, cancel: CancellationToken) -> Result<InboundReceiver>;

    /// Send a plain-text message to a conversation.
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<()>;
}

/// Shared handle to a live session.
pub type SessionHandle = Arc<dyn ChatSession>;

/// Produces authenticated sessions for one chat platform.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// The config tag this factory serves.
    fn client_type(&self) -> ClientType;

    /// Log in with `config` and return a ready-to-sync session.
    ///
    /// Uses token auth when an access token is configured and password auth
    /// otherwise. Login failures are reported as
    /// [`crate::Error::Authentication`].
    async fn authenticate(&self, config: &ClientConfig) -> Result<SessionHandle>;
}
