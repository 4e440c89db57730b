use {async_trait::async_trait, tokio_util::sync::CancellationToken, tracing::debug};

use yuta_channels::{ChatSession, InboundReceiver, Result, inbound_channel};

use crate::{
    api::{Credentials, MatrixApi},
    sync::run_sync_loop,
};

/// A logged-in Matrix account.
///
/// Holds the access token from login; every sync and send reuses it.
pub struct MatrixSession {
    account_id: String,
    credentials: Credentials,
    api: MatrixApi,
}

impl MatrixSession {
    /// Wrap an already authenticated API client.
    #[must_use]
    pub fn new(account_id: String, credentials: Credentials, api: MatrixApi) -> Self {
        Self {
            account_id,
            credentials,
            api,
        }
    }
}

#[async_trait]
impl ChatSession for MatrixSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn user_id(&self) -> &str {
        &self.credentials.user_id
    }

    async fn subscribe(&self, cancel: CancellationToken) -> Result<InboundReceiver> {
        let (tx, rx) = inbound_channel();
        tokio::spawn(run_sync_loop(
            self.api.clone(),
            self.account_id.clone(),
            tx,
            cancel,
        ));
        Ok(rx)
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<()> {
        let resp = self.api.send_text(conversation_id, text).await?;
        debug!(
            account_id = self.account_id,
            room_id = conversation_id,
            event_id = resp.event_id,
            "matrix message sent"
        );
        Ok(())
    }
}
