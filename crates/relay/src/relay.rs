use std::{sync::Arc, time::Duration};

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {
    yuta_channels::{InboundEvent, InboundReceiver, SessionHandle},
    yuta_config::{ClientConfig, NluConfig},
    yuta_nlu::{Error as NluError, NluClient, NluQuery},
};

use crate::admission::{AdmissionPolicy, RelayDecision, SkipReason};

/// Which NLU agent a session's messages are sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NluTarget {
    pub project_id: String,
    pub session_id: String,
    pub language_code: String,
}

impl NluTarget {
    /// Per-client ids, with the client's language code falling back to the
    /// shared NLU default.
    #[must_use]
    pub fn from_config(client: &ClientConfig, nlu: &NluConfig) -> Self {
        Self {
            project_id: client.nlu.project_id.clone(),
            session_id: client.nlu.session_id.clone(),
            language_code: client
                .nlu
                .language_code
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| nlu.language_code.clone()),
        }
    }

    fn query(&self, text: &str) -> NluQuery {
        NluQuery {
            project_id: self.project_id.clone(),
            session_id: self.session_id.clone(),
            text: text.to_string(),
            language_code: self.language_code.clone(),
        }
    }
}

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Skipped(SkipReason),
    Replied { action: Option<String> },
    /// The agent answered with no text; nothing was sent.
    EmptyFulfillment,
    NluFailed,
    SendFailed,
    /// Shutdown arrived while the NLU query was in flight; no reply was sent.
    Cancelled,
}

/// Why [`RelayLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    /// The session's inbound stream ended on its own.
    StreamClosed,
}

/// Relays one session's inbound messages through the NLU service.
///
/// Events are handled strictly one at a time in stream order.
pub struct RelayLoop {
    account_id: String,
    session: SessionHandle,
    nlu: Arc<dyn NluClient>,
    policy: AdmissionPolicy,
    target: NluTarget,
    nlu_timeout: Duration,
}

impl RelayLoop {
    #[must_use]
    pub fn new(
        session: SessionHandle,
        nlu: Arc<dyn NluClient>,
        policy: AdmissionPolicy,
        target: NluTarget,
        nlu_timeout: Duration,
    ) -> Self {
        Self {
            account_id: session.account_id().to_string(),
            session,
            nlu,
            policy,
            target,
            nlu_timeout,
        }
    }

    /// Drain `events` until cancelled or the stream ends.
    pub async fn run(&self, mut events: InboundReceiver, cancel: CancellationToken) -> LoopExit {
        info!(
            account_id = self.account_id,
            started_at_ms = self.policy.started_at_ms(),
            "relay loop started"
        );
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(account_id = self.account_id, "relay loop stopped");
                    return LoopExit::Cancelled;
                },
                ev = events.recv() => ev,
            };
            let Some(event) = event else {
                return LoopExit::StreamClosed;
            };
            self.handle_event(&event, &cancel).await;
        }
    }

    /// Filter, query and reply for a single event.
    ///
    /// The NLU query is abandoned as soon as `cancel` fires.
    pub async fn handle_event(
        &self,
        event: &InboundEvent,
        cancel: &CancellationToken,
    ) -> RelayOutcome {
        #[cfg(feature = "metrics")]
        yuta_metrics::counter!(
            yuta_metrics::relay::EVENTS_RECEIVED_TOTAL,
            yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone()
        )
        .increment(1);

        if let RelayDecision::Skip(reason) = self.policy.decide(event) {
            debug!(
                account_id = self.account_id,
                event_id = event.event_id,
                sender = event.sender,
                reason = reason.as_str(),
                "event skipped"
            );
            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::relay::EVENTS_SKIPPED_TOTAL,
                yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone(),
                yuta_metrics::labels::REASON => reason.as_str()
            )
            .increment(1);
            return RelayOutcome::Skipped(reason);
        }

        #[cfg(feature = "metrics")]
        yuta_metrics::counter!(
            yuta_metrics::relay::EVENTS_ADMITTED_TOTAL,
            yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone()
        )
        .increment(1);

        info!(
            account_id = self.account_id,
            room_id = event.conversation_id,
            sender = event.sender,
            "relaying message to nlu"
        );

        let query = self.target.query(&event.body);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(
                    account_id = self.account_id,
                    event_id = event.event_id,
                    "shutdown during nlu query, dropping event"
                );
                return RelayOutcome::Cancelled;
            },
            res = tokio::time::timeout(self.nlu_timeout, self.nlu.detect_intent(&query)) => {
                res.unwrap_or(Err(NluError::Timeout(self.nlu_timeout)))
            },
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    account_id = self.account_id,
                    event_id = event.event_id,
                    error = %e,
                    "nlu query failed, dropping event"
                );
                #[cfg(feature = "metrics")]
                yuta_metrics::counter!(
                    yuta_metrics::relay::NLU_FAILURES_TOTAL,
                    yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone(),
                    yuta_metrics::labels::ERROR_TYPE => e.kind()
                )
                .increment(1);
                return RelayOutcome::NluFailed;
            },
        };

        if response.fulfillment_text.is_empty() {
            info!(
                account_id = self.account_id,
                event_id = event.event_id,
                action = ?response.action,
                "empty fulfillment, nothing to send"
            );
            return RelayOutcome::EmptyFulfillment;
        }

        if let Err(e) = self
            .session
            .send_text(&event.conversation_id, &response.fulfillment_text)
            .await
        {
            warn!(
                account_id = self.account_id,
                room_id = event.conversation_id,
                error = %e,
                "failed to send reply"
            );
            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::relay::REPLY_ERRORS_TOTAL,
                yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone()
            )
            .increment(1);
            return RelayOutcome::SendFailed;
        }

        #[cfg(feature = "metrics")]
        yuta_metrics::counter!(
            yuta_metrics::relay::REPLIES_SENT_TOTAL,
            yuta_metrics::labels::ACCOUNT_ID => self.account_id.clone(),
            yuta_metrics::labels::ACTION => response.action.clone().unwrap_or_default()
        )
        .increment(1);

        RelayOutcome::Replied {
            action: response.action,
        }
    }
}
