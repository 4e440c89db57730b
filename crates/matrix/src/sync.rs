use std::time::Duration;

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use yuta_channels::InboundSender;

use crate::api::{MatrixApi, SYNC_TIMEOUT};

const RETRY_BASE: Duration = Duration::from_secs(1);
const RETRY_MAX: Duration = Duration::from_secs(60);

/// Long-poll `/sync` and forward timeline events into `tx`.
///
/// Transport errors are retried with exponential backoff (or the server's
/// `retry_after_ms` when rate limited). The loop returns, closing the stream,
/// when `cancel` fires, the receiver is dropped, or the homeserver rejects the
/// access token.
pub(crate) async fn run_sync_loop(
    api: MatrixApi,
    account_id: String,
    tx: InboundSender,
    cancel: CancellationToken,
) {
    info!(account_id, "starting matrix sync loop");
    let mut since: Option<String> = None;
    let mut failures: u32 = 0;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!(account_id, "matrix sync stopped");
                return;
            },
            r = api.sync(since.as_deref(), SYNC_TIMEOUT) => r,
        };

        match result {
            Ok(resp) => {
                failures = 0;
                since = Some(resp.next_batch.clone());
                let events = resp.into_events();
                debug!(account_id, count = events.len(), "got matrix sync batch");
                for event in events {
                    if tx.send(event).await.is_err() {
                        debug!(account_id, "inbound receiver dropped, ending sync");
                        return;
                    }
                }
            },
            Err(e) if e.is_unknown_token() => {
                error!(account_id, error = %e, "matrix access token rejected, ending sync");
                return;
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                yuta_metrics::counter!(
                    yuta_metrics::sessions::SYNC_ERRORS_TOTAL,
                    yuta_metrics::labels::ACCOUNT_ID => account_id.clone()
                )
                .increment(1);

                let delay = e.retry_after_ms().map_or_else(
                    || yuta_common::clock::backoff_delay(RETRY_BASE, failures, RETRY_MAX),
                    Duration::from_millis,
                );
                failures = failures.saturating_add(1);
                warn!(
                    account_id,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "matrix sync failed"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!(account_id, "matrix sync stopped");
                        return;
                    },
                    _ = tokio::time::sleep(delay) => {},
                }
            },
        }
    }
}
