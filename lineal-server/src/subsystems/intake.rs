//! Event intake — the inbound boundary of the warehouse
//!
//! Listens on a TCP address for newline-delimited JSON change events and
//! forwards parsed events onto the bounded intake queue. Malformed lines are
//! logged with the `PARSE_EVENT` code and dropped; a bad event never takes
//! the listener down. The queue is the only coupling to the consumer, so
//! intake backpressure cannot block query handling.

use async_trait::async_trait;
use futures::StreamExt;
use lineal_core::events::parse_event;
use lineal_core::{LineageEvent, LinealError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::{FramedRead, LinesCodec};

/// One raw-line source of change events. The TCP listener wraps each
/// connection in a `TcpLineSource`; tests script their own.
#[async_trait]
pub trait EventSource: Send {
    /// Next raw JSON line, or None when the source is exhausted.
    async fn next_line(&mut self) -> Option<Result<String, LinealError>>;
}

pub struct TcpLineSource {
    framed: FramedRead<TcpStream, LinesCodec>,
}

impl TcpLineSource {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            framed: FramedRead::new(stream, LinesCodec::new()),
        }
    }
}

#[async_trait]
impl EventSource for TcpLineSource {
    async fn next_line(&mut self) -> Option<Result<String, LinealError>> {
        self.framed
            .next()
            .await
            .map(|r| r.map_err(|e| LinealError::Ipc(e.to_string())))
    }
}

/// Drain one event source into the intake queue.
///
/// Returns the number of events forwarded. Parse failures are dropped after
/// logging; a closed queue ends the pump.
pub async fn pump_events(
    source: &mut dyn EventSource,
    tx: &mpsc::Sender<LineageEvent>,
) -> usize {
    let mut forwarded = 0usize;
    while let Some(line) = source.next_line().await {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "event source read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_event(&line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    tracing::warn!("intake queue closed; dropping remaining events");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => {
                // Non-fatal: log and drop, keep consuming.
                tracing::error!(error = %e, raw = %line, "dropping malformed change event");
            }
        }
    }
    forwarded
}

/// Accept loop for the intake listener. Each connection gets its own task;
/// shutdown comes from the broadcast channel.
pub async fn run_intake_listener(
    listen_addr: String,
    tx: mpsc::Sender<LineageEvent>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&listen_addr).await?;
    tracing::info!("Event intake listening on {}", listen_addr);

    loop {
        tokio::select! {
            res = listener.accept() => {
                let (stream, peer) = res?;
                let tx = tx.clone();
                tokio::spawn(async move {
                    tracing::debug!(%peer, "event producer connected");
                    let mut source = TcpLineSource::new(stream);
                    let forwarded = pump_events(&mut source, &tx).await;
                    tracing::debug!(%peer, forwarded, "event producer disconnected");
                });
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutting down event intake...");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSource {
        lines: Vec<String>,
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn next_line(&mut self) -> Option<Result<String, LinealError>> {
            if self.lines.is_empty() {
                None
            } else {
                Some(Ok(self.lines.remove(0)))
            }
        }
    }

    #[tokio::test]
    async fn test_pump_forwards_valid_and_drops_malformed() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut source = ScriptedSource {
            lines: vec![
                r#"{"eventType":"ENTITY_CREATED","guid":"g-1","typeName":"Process"}"#.to_string(),
                "{broken".to_string(),
                String::new(),
                r#"{"eventType":"ENTITY_DELETED","guid":"g-1"}"#.to_string(),
            ],
        };

        let forwarded = pump_events(&mut source, &tx).await;
        assert_eq!(forwarded, 2);

        assert!(matches!(
            rx.recv().await.unwrap(),
            LineageEvent::EntityCreated { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            LineageEvent::EntityDeleted { .. }
        ));
    }

    #[tokio::test]
    async fn test_pump_stops_when_queue_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut source = ScriptedSource {
            lines: vec![
                r#"{"eventType":"ENTITY_CREATED","guid":"g-1","typeName":"Process"}"#.to_string(),
            ],
        };
        let forwarded = pump_events(&mut source, &tx).await;
        assert_eq!(forwarded, 0);
    }
}
