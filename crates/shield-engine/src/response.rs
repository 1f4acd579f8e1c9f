//! Compose the host-visible response and deliver it, possibly late.

use std::time::Duration;

use serde::Serialize;
use shield_config::Behavior;
use tokio::{runtime::Handle, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// The only value returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    /// Dismiss now or keep the shield up.
    pub behavior: Behavior,
    /// Delay before the host sees the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl EngineResponse {
    /// The fallback response: close, no delay.
    pub const fn close() -> Self {
        Self {
            behavior: Behavior::Close,
            delay_ms: None,
        }
    }

    /// Build a response; an absent behavior means close.
    pub fn compose(behavior: Option<Behavior>, delay_ms: Option<u64>) -> Self {
        Self {
            behavior: behavior.unwrap_or_default(),
            delay_ms,
        }
    }

    /// Delay as a duration, if any.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }
}

/// A response whose delivery waits on a timer.
///
/// The completion runs exactly once: when the timer expires, or right away if
/// [`cancel`](Self::cancel) is called first.
pub struct PendingResponse {
    /// Cuts the wait short.
    token: CancellationToken,
    /// Timer task; finishes after the completion has run.
    handle: JoinHandle<()>,
}

impl PendingResponse {
    /// Arm a timer on `rt` that delivers `response` to `completion` after `delay`.
    pub(crate) fn arm<F>(rt: &Handle, response: EngineResponse, delay: Duration, completion: F) -> Self
    where
        F: FnOnce(EngineResponse) + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let handle = rt.spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {
                    trace!(delay_ms = delay.as_millis() as u64, "response_timer_expired");
                }
                _ = cancel.cancelled() => {
                    trace!("response_timer_cancelled");
                }
            }
            completion(response);
        });
        Self { token, handle }
    }

    /// Stop waiting and deliver now.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the completion has run.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for delivery.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn compose_defaults_to_close() {
        assert_eq!(EngineResponse::compose(None, None), EngineResponse::close());
        let r = EngineResponse::compose(Some(Behavior::Defer), Some(10));
        assert_eq!(r.delay(), Some(Duration::from_millis(10)));
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json, serde_json::json!({ "behavior": "defer", "delayMs": 10 }));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_delivers_once_after_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let start = time::Instant::now();
        let pending = PendingResponse::arm(
            &Handle::current(),
            EngineResponse::close(),
            Duration::from_millis(500),
            move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            },
        );
        pending.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_delivers_immediately_and_only_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let start = time::Instant::now();
        let pending = PendingResponse::arm(
            &Handle::current(),
            EngineResponse::close(),
            Duration::from_secs(60),
            move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            },
        );
        pending.cancel();
        pending.cancel();
        pending.wait().await;
        assert!(start.elapsed() < Duration::from_secs(60));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
