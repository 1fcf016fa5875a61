//! Append-only destinations for decoded log records

use crate::errors::WriteError;
use crate::telemetry::LogRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Line-oriented destination shared by every inbound request.
///
/// Implementations must write one record's line as a unit: concurrent callers
/// may interleave whole lines but never bytes within a line.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn append(&self, record: &LogRecord) -> Result<(), WriteError>;
}

/// Text file with one rendered record per line.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Create the file, truncating any previous contents.
    pub async fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;

        info!("Writing received log records to {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn append(&self, record: &LogRecord) -> Result<(), WriteError> {
        let mut line = record.render()?;
        line.push('\n');

        // Held for exactly one record.
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        // tokio hands the write to a blocking thread; wait for it to land.
        file.flush().await?;

        Ok(())
    }
}

/// In-memory sink keeping the rendered lines.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lines(&self) -> Vec<String> {
        self.lines.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.lines.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn append(&self, record: &LogRecord) -> Result<(), WriteError> {
        let line = record.render()?;
        let mut lines = self.lines.lock().await;
        lines.push(line);
        debug!("Appended record to memory sink, current size: {}", lines.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::AnyValue;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn record(body: &str) -> LogRecord {
        LogRecord {
            severity_number: 9,
            severity_text: "INFO".to_string(),
            body: AnyValue::StringValue(body.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_file_sink_truncates_and_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("received-logs.txt");
        std::fs::write(&path, "stale contents\n").unwrap();

        let sink = FileSink::create(&path).await.unwrap();
        assert_eq!(sink.path(), path.as_path());

        sink.append(&record("a")).await.unwrap();
        sink.append(&record("b")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(LogRecord::parse(lines[0]).unwrap(), record("a"));
        assert_eq!(LogRecord::parse(lines[1]).unwrap(), record("b"));
        assert!(contents.ends_with('\n'));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_sink_concurrent_appends_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("received-logs.txt");
        let sink = Arc::new(FileSink::create(&path).await.unwrap());

        let markers: Vec<String> = (0..64)
            .map(|i| format!("marker-{}-{}", i, "x".repeat(512 + i)))
            .collect();

        let handles: Vec<_> = markers
            .iter()
            .cloned()
            .map(|marker| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move { sink.append(&record(&marker)).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let written: HashSet<String> = contents
            .lines()
            .map(|line| match LogRecord::parse(line).unwrap().body {
                AnyValue::StringValue(s) => s,
                other => panic!("unexpected body {:?}", other),
            })
            .collect();

        assert_eq!(contents.lines().count(), markers.len());
        assert_eq!(written, markers.into_iter().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn test_file_sink_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("received-logs.txt");

        assert!(FileSink::create(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        sink.append(&record("first")).await.unwrap();
        sink.append(&record("second")).await.unwrap();

        let lines = sink.lines().await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], record("first").render().unwrap());
        assert_eq!(lines[1], record("second").render().unwrap());
    }
}
