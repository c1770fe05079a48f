use std::{future::Future, sync::Arc};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::{EnrichedEvent, EventBus, EventInbox};

pub trait Worker: Send + Sized + 'static {
    const WORKER_ID: &'static str;

    fn handle(
        &mut self,
        event: Arc<EnrichedEvent>,
        bus: &EventBus,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Drive `worker` until shutdown or until every publisher is gone.
pub async fn run_worker<W: Worker>(
    mut worker: W,
    mut inbox: EventInbox,
    bus: EventBus,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                debug!(worker = W::WORKER_ID, "shutdown requested");
                return Ok(());
            }
            event = inbox.recv() => match event {
                Some(event) => {
                    let event_type = event.event.event_type();
                    let seq = event.ingest_seq;
                    if let Err(e) = worker.handle(event, &bus).await {
                        warn!(worker = W::WORKER_ID, event_type, seq, error = %e, "event handling failed");
                    }
                }
                None => return Ok(()),
            },
        }
    }
}
