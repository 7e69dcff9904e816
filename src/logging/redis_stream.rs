//! Redis stream log sink
//!
//! Every enabled event is appended to a Redis stream (default
//! `worker_logs`) so that a fleet of workers can be watched from one place:
//!
//! ```text
//! XADD worker_logs * worker_name <service> timestamp <utc> log_level <LVL> log_message <text>
//! ```
//!
//! Events are handed to a background task over an unbounded channel; the
//! worker loop never waits on Redis to log. After a failed connect the
//! writer waits a few seconds before the next attempt and discards entries
//! in between.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::console::level_tag;

/// Default stream receiving worker logs
pub const DEFAULT_LOG_STREAM: &str = "worker_logs";

/// Timestamp layout stored in stream entries
pub const STREAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One record appended to the log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub worker_name: String,
    pub timestamp: String,
    pub log_level: &'static str,
    pub log_message: String,
}

impl LogEntry {
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("worker_name", self.worker_name.as_str()),
            ("timestamp", self.timestamp.as_str()),
            ("log_level", self.log_level),
            ("log_message", self.log_message.as_str()),
        ]
    }
}

enum StreamMessage {
    Entry(LogEntry),
    Flush(oneshot::Sender<()>),
}

/// Collects the `message` field and appends the remaining fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    extra: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.extra.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.extra
        } else {
            format!("{} {}", self.message, self.extra)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            if !self.extra.is_empty() {
                self.extra.push(' ');
            }
            let _ = write!(self.extra, "{}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            if !self.extra.is_empty() {
                self.extra.push(' ');
            }
            let _ = write!(self.extra, "{}={:?}", field.name(), value);
        }
    }
}

/// `tracing` layer shipping events to the Redis log stream
pub struct RedisStreamLayer {
    worker_name: String,
    tx: mpsc::UnboundedSender<StreamMessage>,
}

/// Handle used to wait until queued records reached Redis
#[derive(Clone)]
pub struct StreamFlusher {
    tx: mpsc::UnboundedSender<StreamMessage>,
}

impl StreamFlusher {
    /// Resolve once every record queued before this call has been written.
    ///
    /// Returns `false` when the writer is gone or the timeout elapsed.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(StreamMessage::Flush(ack_tx)).is_err() {
            return false;
        }
        matches!(tokio::time::timeout(timeout, ack_rx).await, Ok(Ok(())))
    }
}

impl RedisStreamLayer {
    /// Create the layer and spawn its writer task.
    ///
    /// Must be called from within a Tokio runtime. The connection is opened
    /// lazily by the writer, so an unreachable server only costs stderr noise.
    pub fn spawn(
        client: redis::Client,
        stream: impl Into<String>,
        worker_name: impl Into<String>,
    ) -> (Self, StreamFlusher) {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(client, stream.into(), rx));
        (
            Self {
                worker_name: worker_name.into(),
                tx: tx.clone(),
            },
            StreamFlusher { tx },
        )
    }

    fn entry_for(&self, event: &Event<'_>) -> LogEntry {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        LogEntry {
            worker_name: self.worker_name.clone(),
            timestamp: Utc::now().format(STREAM_TIME_FORMAT).to_string(),
            log_level: level_tag(event.metadata().level()),
            log_message: visitor.finish(),
        }
    }
}

impl<S: Subscriber> Layer<S> for RedisStreamLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // the client library's own diagnostics would feed back into the stream
        if event.metadata().target().starts_with("redis") {
            return;
        }
        let _ = self.tx.send(StreamMessage::Entry(self.entry_for(event)));
    }
}

/// Pause between connection attempts after a failure
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Connection attempts are suspended for a while after each failure;
/// entries arriving in that window are dropped.
struct ReconnectGate {
    backoff: Duration,
    retry_at: Option<Instant>,
    dropped: u64,
}

impl ReconnectGate {
    fn new(backoff: Duration) -> Self {
        Self {
            backoff,
            retry_at: None,
            dropped: 0,
        }
    }

    /// Whether a connection attempt is allowed at `now`; counts a drop otherwise
    fn try_attempt(&mut self, now: Instant) -> bool {
        match self.retry_at {
            Some(at) if now < at => {
                self.dropped += 1;
                false
            }
            _ => true,
        }
    }

    fn failed(&mut self, now: Instant) {
        self.retry_at = Some(now + self.backoff);
        self.dropped += 1;
    }

    /// Reset after a successful connect, returning the number of lost entries
    fn connected(&mut self) -> u64 {
        self.retry_at = None;
        std::mem::take(&mut self.dropped)
    }
}

async fn run_writer(
    client: redis::Client,
    stream: String,
    mut rx: mpsc::UnboundedReceiver<StreamMessage>,
) {
    let mut conn: Option<ConnectionManager> = None;
    let mut gate = ReconnectGate::new(RECONNECT_BACKOFF);

    while let Some(message) = rx.recv().await {
        let entry = match message {
            StreamMessage::Entry(entry) => entry,
            StreamMessage::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        if conn.is_none() {
            if !gate.try_attempt(Instant::now()) {
                continue;
            }
            match ConnectionManager::new(client.clone()).await {
                Ok(c) => {
                    let lost = gate.connected();
                    if lost > 0 {
                        eprintln!("Log stream reconnected, {} entries were dropped", lost);
                    }
                    conn = Some(c);
                }
                Err(e) => {
                    gate.failed(Instant::now());
                    eprintln!("ConnectionError while logging to Redis: {}", e);
                    continue;
                }
            }
        }

        if let Some(c) = conn.as_mut() {
            let result: redis::RedisResult<String> =
                c.xadd(&stream, "*", &entry.fields()[..]).await;
            if let Err(e) = result {
                if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
                    eprintln!("ConnectionError while logging to Redis: {}", e);
                } else {
                    eprintln!("Unexpected error while logging to Redis: {}", e);
                }
            }
        }
    }
}
