//! Single-context queue for UI-affine side effects.
//!
//! Opening URIs and scheduling notifications must happen on one designated
//! execution context. Jobs are drained in order by a single spawned task; the
//! engine enqueues and moves on, and outcomes are only logged.

use std::{sync::Arc, time::Duration};

use serde_json::{Map, Value};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    deps::{NotificationScheduler, UriOpener},
};

/// Work item for the UI context.
enum UiJob {
    /// Open a URI in the host app.
    OpenUri(String),
    /// Schedule a notification.
    Notify {
        /// Substituted payload.
        payload: Map<String, Value>,
        /// Delay before the notification fires.
        fire_delay: Duration,
    },
    /// Signal once every earlier job has run.
    Flush(oneshot::Sender<()>),
}

/// Handle for enqueueing UI-affine work.
#[derive(Clone)]
pub struct UiQueue {
    /// Job channel into the drain task.
    tx: mpsc::UnboundedSender<UiJob>,
}

impl UiQueue {
    /// Spawn the drain task on `rt`.
    pub fn spawn(
        rt: &Handle,
        opener: Arc<dyn UriOpener>,
        notifier: Arc<dyn NotificationScheduler>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        rt.spawn(drain(rx, opener, notifier));
        Self { tx }
    }

    /// Enqueue a URI open.
    pub fn open_uri(&self, uri: String) -> Result<()> {
        self.tx
            .send(UiJob::OpenUri(uri))
            .map_err(|_| Error::ChannelClosed)
    }

    /// Enqueue a notification.
    pub fn schedule_notification(
        &self,
        payload: Map<String, Value>,
        fire_delay: Duration,
    ) -> Result<()> {
        self.tx
            .send(UiJob::Notify {
                payload,
                fire_delay,
            })
            .map_err(|_| Error::ChannelClosed)
    }

    /// Wait until every job enqueued so far has been handled.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(UiJob::Flush(done_tx))
            .map_err(|_| Error::ChannelClosed)?;
        done_rx.await.map_err(|_| Error::ChannelClosed)
    }
}

/// Run jobs one at a time, in arrival order.
async fn drain(
    mut rx: mpsc::UnboundedReceiver<UiJob>,
    opener: Arc<dyn UriOpener>,
    notifier: Arc<dyn NotificationScheduler>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            UiJob::OpenUri(uri) => {
                if opener.open_uri(&uri).await {
                    info!(uri = %uri, "open_uri");
                } else {
                    warn!(uri = %uri, "open_uri rejected by host");
                }
            }
            UiJob::Notify {
                payload,
                fire_delay,
            } => {
                let keys = payload.len();
                match notifier.schedule(payload, fire_delay).await {
                    Ok(()) => info!(
                        keys,
                        delay_ms = fire_delay.as_millis() as u64,
                        "notification_scheduled"
                    ),
                    Err(e) => warn!("notification scheduling failed: {}", e),
                }
            }
            UiJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("ui queue drained and closed");
}
