//! Bounded many-producer, single-consumer event conduit.
//!
//! Backpressure stalls producers instead of dropping records. Records from a
//! single producer arrive in submission order; records from different
//! producers interleave in arrival order.

use pitlane_types::EventRecord;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default conduit capacity. Bounds memory under a slow consumer.
pub const DEFAULT_SINK_CAPACITY: usize = 100;

/// Errors from submitting to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The consumer closed the stream or went away.
    #[error("Event sink closed")]
    Closed,
}

/// Create a connected sink/stream pair with the given capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero, like [`tokio::sync::mpsc::channel`].
pub fn event_channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSink { tx }, EventStream { rx })
}

/// Producer side. Clone it once per producing task.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EventRecord>,
}

impl EventSink {
    /// Submit a record, waiting for capacity if the conduit is full.
    ///
    /// Fails with [`SinkError::Closed`] once the stream has been closed or
    /// dropped; never blocks past that point.
    pub async fn submit(&self, record: EventRecord) -> Result<(), SinkError> {
        self.tx.send(record).await.map_err(|_| SinkError::Closed)
    }

    /// Whether the consumer has closed or dropped the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots right now.
    pub fn available_capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer side. There is exactly one per sink.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<EventRecord>,
}

impl EventStream {
    /// Wait for the next record.
    ///
    /// Returns `None` at end-of-stream: the stream was closed and drained, or
    /// every producer has been dropped.
    pub async fn next_event(&mut self) -> Option<EventRecord> {
        self.rx.recv().await
    }

    /// Take a record if one is ready, without waiting.
    pub fn try_next_event(&mut self) -> Option<EventRecord> {
        self.rx.try_recv().ok()
    }

    /// Close the conduit.
    ///
    /// Only the owner of the stream's lifetime calls this. Records already
    /// buffered remain readable; every later submit fails.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitlane_types::Topic;
    use std::time::Duration;

    #[tokio::test]
    async fn test_single_producer_order_is_preserved() {
        let (sink, mut stream) = event_channel(4);

        let producer = tokio::spawn(async move {
            for i in 0..20 {
                sink.submit(EventRecord::log(Topic::Ring, format!("line {i}")))
                    .await
                    .unwrap();
            }
        });

        let mut received = Vec::new();
        while let Some(record) = stream.next_event().await {
            received.push(record.text().unwrap().to_string());
        }
        producer.await.unwrap();

        let expected: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        assert_eq!(received, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_lose_nothing() {
        let (sink, mut stream) = event_channel(DEFAULT_SINK_CAPACITY);
        let producers = 8;
        let per_producer = 250;

        let mut handles = Vec::new();
        for p in 0..producers {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..per_producer {
                    sink.submit(EventRecord::log(Topic::Parallel, format!("{p}:{i}")))
                        .await
                        .unwrap();
                }
            }));
        }
        drop(sink);

        let mut last_seen = vec![None::<usize>; producers];
        let mut total = 0;
        while let Some(record) = stream.next_event().await {
            let (p, i) = record.text().unwrap().split_once(':').unwrap();
            let (p, i): (usize, usize) = (p.parse().unwrap(), i.parse().unwrap());
            // Per-producer order holds even though producers interleave.
            if let Some(prev) = last_seen[p] {
                assert_eq!(i, prev + 1);
            }
            last_seen[p] = Some(i);
            total += 1;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(total, producers * per_producer);
    }

    #[tokio::test]
    async fn test_submit_after_close_fails() {
        let (sink, mut stream) = event_channel(4);
        sink.submit(EventRecord::untargeted("before")).await.unwrap();

        stream.close();
        assert!(sink.is_closed());
        assert_eq!(
            sink.submit(EventRecord::untargeted("after")).await,
            Err(SinkError::Closed)
        );

        // Buffered records survive the close, then the stream ends.
        assert_eq!(stream.next_event().await.unwrap().text(), Some("before"));
        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_close_unblocks_stalled_producer() {
        let (sink, mut stream) = event_channel(1);
        sink.submit(EventRecord::untargeted("fills")).await.unwrap();
        assert_eq!(sink.available_capacity(), 0);

        let stalled = tokio::spawn({
            let sink = sink.clone();
            async move { sink.submit(EventRecord::untargeted("stalls")).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!stalled.is_finished());

        stream.close();
        assert_eq!(stalled.await.unwrap(), Err(SinkError::Closed));
    }

    #[tokio::test]
    async fn test_try_next_event_does_not_wait() {
        let (sink, mut stream) = event_channel(2);
        assert!(stream.try_next_event().is_none());

        sink.submit(EventRecord::untargeted("ready")).await.unwrap();
        assert_eq!(stream.try_next_event().unwrap().text(), Some("ready"));
    }

    #[tokio::test]
    async fn test_dropping_all_producers_ends_stream() {
        let (sink, mut stream) = event_channel(2);
        drop(sink);
        assert!(stream.next_event().await.is_none());
    }
}
