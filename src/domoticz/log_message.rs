//! Messages for the Domoticz log.
//!
//! A single worker drains the queue, so messages reach Domoticz one at a time
//! and in the order they were submitted, however fast they are produced.

use crate::constants::PARAM_STRING_LOG;
use crate::domoticz::http::encode_component;
use crate::domoticz::sink::PushSink;
use log::warn;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Ordered, non-blocking delivery of log messages.
pub struct DomoticzLog {
    tx: mpsc::UnboundedSender<String>,
    worker: JoinHandle<u64>,
}

impl DomoticzLog {
    /// Spawns the delivery worker on the current tokio runtime.
    pub fn new(sink: Arc<dyn PushSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let worker = tokio::spawn(async move {
            let mut delivered = 0u64;
            while let Some(message) = rx.recv().await {
                let payload = format!("{PARAM_STRING_LOG}{}", encode_component(&message));
                match sink.push(&payload).await {
                    Ok(()) => delivered += 1,
                    Err(e) => warn!("Domoticz log message lost: {e}"),
                }
            }
            delivered
        });
        DomoticzLog { tx, worker }
    }

    /// Queues a message; never blocks.
    pub fn send(&self, message: impl Into<String>) {
        if self.tx.send(message.into()).is_err() {
            warn!("Domoticz log worker has stopped");
        }
    }

    /// Delivers what is queued, then stops the worker.
    ///
    /// Returns the number of messages accepted by the backend.
    pub async fn close(self) -> u64 {
        drop(self.tx);
        self.worker.await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeleinfoError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct SlowSink {
        received: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushSink for SlowSink {
        async fn push(&self, payload: &str) -> Result<(), TeleinfoError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.received.lock().unwrap().push(payload.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_messages_delivered_in_order() {
        let sink = Arc::new(SlowSink::default());
        let log = DomoticzLog::new(sink.clone());
        log.send("first");
        log.send("second message");
        log.send("third");
        assert_eq!(log.close().await, 3);

        let received = sink.received.lock().unwrap();
        assert_eq!(
            *received,
            vec![
                "?type=command&param=addlogmessage&message=first".to_string(),
                "?type=command&param=addlogmessage&message=second%20message".to_string(),
                "?type=command&param=addlogmessage&message=third".to_string(),
            ]
        );
    }
}
