use std::{sync::Arc, time::Duration};

use {
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use {
    yuta_channels::{Error as ChannelError, SessionFactory, SessionHandle},
    yuta_common::clock::backoff_delay,
    yuta_config::{ClientConfig, NluConfig, RelayConfig},
    yuta_nlu::NluClient,
};

use crate::{
    admission::AdmissionPolicy,
    relay::{LoopExit, NluTarget, RelayLoop},
};

const MAX_LOGIN_BACKOFF: Duration = Duration::from_secs(60);

/// How a supervised session ended.
#[derive(Debug)]
pub enum SessionExit {
    /// Shutdown was requested.
    Shutdown,
    /// The session gave up; other sessions are unaffected.
    Disabled(ChannelError),
}

/// Owns one configured client for the lifetime of the process: logs in with
/// retries, then relays until shutdown or an unrecoverable error.
pub struct SessionSupervisor {
    client: ClientConfig,
    factory: Arc<dyn SessionFactory>,
    nlu: Arc<dyn NluClient>,
    nlu_config: NluConfig,
    relay: RelayConfig,
    started_at_ms: i64,
}

impl SessionSupervisor {
    #[must_use]
    pub fn new(
        client: ClientConfig,
        factory: Arc<dyn SessionFactory>,
        nlu: Arc<dyn NluClient>,
        nlu_config: NluConfig,
        relay: RelayConfig,
        started_at_ms: i64,
    ) -> Self {
        Self {
            client,
            factory,
            nlu,
            nlu_config,
            relay,
            started_at_ms,
        }
    }

    #[must_use]
    pub fn account_id(&self) -> String {
        self.client.account_id()
    }

    pub async fn run(self, cancel: CancellationToken) -> SessionExit {
        let account_id = self.account_id();
        let exit = self.supervise(&account_id, cancel).await;
        if let SessionExit::Disabled(e) = &exit {
            error!(account_id, error = %e, "session disabled");
            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::sessions::DISABLED_TOTAL,
                yuta_metrics::labels::ACCOUNT_ID => account_id.clone()
            )
            .increment(1);
        }
        exit
    }

    async fn supervise(&self, account_id: &str, cancel: CancellationToken) -> SessionExit {
        let session = match self.login(account_id, &cancel).await {
            Ok(Some(session)) => session,
            Ok(None) => return SessionExit::Shutdown,
            Err(e) => return SessionExit::Disabled(e),
        };

        let events = match session.subscribe(cancel.clone()).await {
            Ok(rx) => rx,
            Err(e) => return SessionExit::Disabled(e),
        };

        let relay = RelayLoop::new(
            Arc::clone(&session),
            Arc::clone(&self.nlu),
            AdmissionPolicy::new(
                session.user_id(),
                self.client.allowed_senders.clone(),
                self.started_at_ms,
            ),
            NluTarget::from_config(&self.client, &self.nlu_config),
            self.nlu_config.timeout(),
        );

        #[cfg(feature = "metrics")]
        yuta_metrics::gauge!(yuta_metrics::sessions::ACTIVE).increment(1.0);

        let exit = relay.run(events, cancel.clone()).await;

        #[cfg(feature = "metrics")]
        yuta_metrics::gauge!(yuta_metrics::sessions::ACTIVE).decrement(1.0);

        match exit {
            LoopExit::Cancelled => SessionExit::Shutdown,
            LoopExit::StreamClosed if cancel.is_cancelled() => SessionExit::Shutdown,
            LoopExit::StreamClosed => SessionExit::Disabled(ChannelError::StreamClosed {
                account_id: account_id.to_string(),
            }),
        }
    }

    /// `Ok(None)` means shutdown was requested while logging in.
    async fn login(
        &self,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SessionHandle>, ChannelError> {
        let attempts = self.relay.login_attempts.max(1);
        let mut attempt = 0;
        loop {
            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::sessions::LOGIN_ATTEMPTS_TOTAL,
                yuta_metrics::labels::ACCOUNT_ID => account_id.to_string()
            )
            .increment(1);

            let result = tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                r = self.factory.authenticate(&self.client) => r,
            };
            let err = match result {
                Ok(session) => {
                    info!(account_id, user_id = session.user_id(), "session logged in");
                    return Ok(Some(session));
                },
                Err(e) => e,
            };

            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::sessions::LOGIN_FAILURES_TOTAL,
                yuta_metrics::labels::ACCOUNT_ID => account_id.to_string()
            )
            .increment(1);

            attempt += 1;
            if attempt >= attempts {
                return Err(err);
            }

            let delay = backoff_delay(self.relay.login_backoff(), attempt - 1, MAX_LOGIN_BACKOFF);
            warn!(
                account_id,
                attempt,
                attempts,
                retry_in_ms = delay.as_millis() as u64,
                error = %err,
                "login failed, retrying"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(delay) => {},
            }
        }
    }
}
