//! File-based audit trail.
//!
//! Every accepted event is appended as one JSON line to `<log_dir>/<event>.log`,
//! internal failures go to `<log_dir>/errors.log`, and a bounded copy of recent
//! activity is kept in the rolling web log served at `/logs.json`. Appends to
//! the same file are serialized through a per-path lock.

use std::{
    collections::VecDeque,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use hw_common::utils::utcnow_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::event::REPOSITORY_RENAME;

pub const ERROR_LOG: &str = "errors";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AuditError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    event: &'a str,
    details: &'a Value,
}

#[derive(Debug, Serialize)]
struct ErrorEntry<'a> {
    timestamp: String,
    #[serde(rename = "type")]
    kind: &'static str,
    message: &'a str,
    details: &'a Value,
}

/// Entry of the rolling web log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebLogEntry {
    pub timestamp: String,
    pub event: String,
    pub message: String,
}

impl WebLogEntry {
    pub fn for_event(event: &str, details: &Value) -> Self {
        Self {
            timestamp: utcnow_rfc3339(),
            event: event.to_string(),
            message: summary(event, details),
        }
    }
}

fn summary(event: &str, details: &Value) -> String {
    if event == REPOSITORY_RENAME {
        return format!(
            "Repository renamed from {} to {} ({})",
            str_at(details, "/changes/repository/name/from"),
            str_at(details, "/repository/name"),
            str_at(details, "/repository/full_name"),
        );
    }
    format!("{event} event occurred")
}

fn str_at<'a>(details: &'a Value, pointer: &str) -> &'a str {
    details.pointer(pointer).and_then(Value::as_str).unwrap_or("?")
}

pub struct AuditLogger {
    dir: PathBuf,
    file_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    web_log: RollingLog,
}

impl AuditLogger {
    /// Create the log directory and load the rolling web log from disk
    pub async fn open(
        dir: impl Into<PathBuf>,
        web_log_path: impl Into<PathBuf>,
        web_log_capacity: usize,
    ) -> Result<Self, AuditError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| AuditError::io(&dir, e))?;

        let web_log = RollingLog::load(web_log_path, web_log_capacity).await?;

        Ok(Self { dir, file_locks: DashMap::new(), web_log })
    }

    pub fn event_log_path(&self, event: &str) -> PathBuf {
        self.dir.join(format!("{event}.log"))
    }

    pub fn web_log(&self) -> &RollingLog {
        &self.web_log
    }

    /// Append an accepted event to its log file and to the web log
    pub async fn log_event(&self, event: &str, details: &Value) -> Result<(), AuditError> {
        let entry = LogEntry { timestamp: utcnow_rfc3339(), event, details };
        let line = serde_json::to_string(&entry)?;
        self.append_line(&self.event_log_path(event), &line).await?;
        debug!(event, "Logged event");

        self.web_log.push(WebLogEntry::for_event(event, details)).await
    }

    /// Append an internal failure to `errors.log`
    pub async fn log_error(&self, message: &str, details: &Value) -> Result<(), AuditError> {
        let entry = ErrorEntry { timestamp: utcnow_rfc3339(), kind: "error", message, details };
        let line = serde_json::to_string(&entry)?;
        self.append_line(&self.event_log_path(ERROR_LOG), &line).await
    }

    async fn append_line(&self, path: &Path, line: &str) -> Result<(), AuditError> {
        let lock = self.file_locks.entry(path.to_path_buf()).or_default().clone();
        let _guard = lock.lock().await;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| AuditError::io(path, e))?;

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        file.write_all(&buf).await.map_err(|e| AuditError::io(path, e))?;
        file.flush().await.map_err(|e| AuditError::io(path, e))
    }
}

/// Bounded FIFO of recent events, persisted as a JSON array.
///
/// The in-memory copy is the source of truth; every push rewrites the file
/// through a temp file and a rename while holding the lock, so concurrent
/// pushes cannot lose entries and readers never see a half-written file.
pub struct RollingLog {
    path: PathBuf,
    capacity: usize,
    entries: Mutex<VecDeque<WebLogEntry>>,
}

impl RollingLog {
    pub async fn load(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| AuditError::io(parent, e))?;
        }

        let mut entries: VecDeque<WebLogEntry> = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Unreadable web log, starting empty");
                VecDeque::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => return Err(AuditError::io(&path, e)),
        };

        while entries.len() > capacity {
            entries.pop_front();
        }

        Ok(Self { path, capacity, entries: Mutex::new(entries) })
    }

    /// Append an entry, evicting the oldest ones beyond capacity
    pub async fn push(&self, entry: WebLogEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.lock().await;
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        let json = serde_json::to_vec_pretty(&*entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).await.map_err(|e| AuditError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| AuditError::io(&self.path, e))
    }

    pub async fn snapshot(&self) -> Vec<WebLogEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    /// File contents as persisted, `[]` if nothing was written yet
    pub async fn read_raw(&self) -> Result<Vec<u8>, AuditError> {
        match fs::read(&self.path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(b"[]".to_vec()),
            Err(e) => Err(AuditError::io(&self.path, e)),
        }
    }
}
