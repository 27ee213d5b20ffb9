//! Event consumer — the only writer to the graph store
//!
//! A single task drains the intake queue and applies each event under the
//! store's write lock. One writer means per-GUID ordering falls out of queue
//! order, and upsert idempotence absorbs at-least-once redelivery. Apply
//! failures are logged and discarded; they never reach query callers.

use lineal_core::{LineageEvent, LineageGraph};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Apply one event, downgrading not-found to a warning. Returns true when
/// the event mutated the graph.
pub async fn apply_event(graph: &Arc<RwLock<LineageGraph>>, event: LineageEvent) -> bool {
    let subject = event.subject_guid().to_string();
    let mut store = graph.write().await;
    match store.apply(event) {
        Ok(()) => true,
        Err(e) if e.is_not_found() => {
            tracing::warn!(guid = %subject, error = %e, "discarding event for unknown element");
            false
        }
        Err(e) => {
            tracing::error!(guid = %subject, error = %e, "failed to apply change event");
            false
        }
    }
}

pub async fn run_consumer_loop(
    graph: Arc<RwLock<LineageGraph>>,
    mut rx: mpsc::Receiver<LineageEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        apply_event(&graph, event).await;
                    }
                    None => {
                        tracing::info!("Intake queue closed; consumer stopping");
                        break;
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutting down event consumer...");
                break;
            }
        }
    }
}
