use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::error::{AppResult, MetricsError};

/// Flush threshold for the JSON lines buffer.
const WRITE_BUFFER_BYTES: usize = 64 * 1024;
/// Records queued for the writer task before new ones are dropped.
const REQUEST_LOG_CHANNEL_CAPACITY: usize = 10_000;

pub const TELEMETRY_EVENT_TYPE: &str = "VuloadApiTest";

/// One structured record per executed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord<'rec> {
    pub event_type: &'static str,
    pub scenario: &'rec str,
    pub label: &'rec str,
    pub endpoint: &'rec str,
    pub request_data: serde_json::Value,
    pub response_body: &'rec str,
    pub status_code: u16,
    pub duration_ms: u64,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'rec str>,
}

/// Destination of per-request telemetry.
#[derive(Debug, Clone)]
pub enum RequestLog {
    /// Emit each record as a `tracing` event on the `vuload::telemetry` target.
    Tracing,
    /// Send each record as a JSON line to the writer task. Records that do
    /// not fit in the queue are counted in `dropped`.
    Jsonl {
        sender: mpsc::Sender<String>,
        dropped: Arc<AtomicU64>,
    },
}

impl RequestLog {
    pub fn emit(&self, record: &TelemetryRecord<'_>) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                warn!("Failed to encode request record: {}", err);
                return;
            }
        };
        match self {
            RequestLog::Tracing => {
                info!(target: "vuload::telemetry", "{}", line);
            }
            RequestLog::Jsonl { sender, dropped } => match sender.try_send(line) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Request log writer already closed.");
                }
            },
        }
    }
}

/// Owns the JSON lines writer task.
#[derive(Debug)]
pub struct RequestLogHandle {
    task: JoinHandle<Result<u64, MetricsError>>,
    dropped: Arc<AtomicU64>,
}

impl RequestLogHandle {
    /// Records discarded because the writer queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Waits for every queued record to be written and flushed. All
    /// [`RequestLog`] clones must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer task failed or panicked.
    pub async fn finish(self) -> AppResult<u64> {
        Ok(self.task.await??)
    }
}

/// Creates `path` and spawns the writer task behind a [`RequestLog::Jsonl`].
///
/// # Errors
///
/// Returns an error when the file cannot be created.
pub fn setup_request_log(path: &Path) -> Result<(RequestLog, RequestLogHandle), MetricsError> {
    setup_request_log_with_capacity(path, REQUEST_LOG_CHANNEL_CAPACITY)
}

pub(crate) fn setup_request_log_with_capacity(
    path: &Path,
    capacity: usize,
) -> Result<(RequestLog, RequestLogHandle), MetricsError> {
    let file = std::fs::File::create(path).map_err(|err| MetricsError::Io {
        context: "create request log",
        source: err,
    })?;
    let (sender, mut receiver) = mpsc::channel::<String>(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(async move {
        let mut writer = BufWriter::new(File::from_std(file));
        let mut buffer = String::with_capacity(WRITE_BUFFER_BYTES);
        let mut lines: u64 = 0;

        while let Some(line) = receiver.recv().await {
            buffer.push_str(&line);
            buffer.push('\n');
            lines = lines.saturating_add(1);
            if buffer.len() >= WRITE_BUFFER_BYTES {
                write_buffer(&mut writer, &buffer).await?;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            write_buffer(&mut writer, &buffer).await?;
        }
        writer.flush().await.map_err(|err| MetricsError::Io {
            context: "flush request log",
            source: err,
        })?;
        Ok(lines)
    });

    Ok((
        RequestLog::Jsonl {
            sender,
            dropped: Arc::clone(&dropped),
        },
        RequestLogHandle { task, dropped },
    ))
}

async fn write_buffer(writer: &mut BufWriter<File>, buffer: &str) -> Result<(), MetricsError> {
    writer
        .write_all(buffer.as_bytes())
        .await
        .map_err(|err| MetricsError::Io {
            context: "write request log",
            source: err,
        })
}
