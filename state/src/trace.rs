//! Store operation tracing
//!
//! A [`TraceSink`] receives one JSON line per traced store operation.

use parking_lot::Mutex;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use wolochain_core::WolochainResult;

/// Kind of traced store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOperation {
    Read,
    Write,
    Delete,
}

#[derive(Serialize)]
struct TraceRecord {
    operation: TraceOperation,
    key: String,
    value: String,
    metadata: TraceMetadata,
}

#[derive(Serialize)]
struct TraceMetadata {
    #[serde(rename = "blockHeight")]
    block_height: u64,
}

/// Shared, line-oriented trace writer
#[derive(Clone)]
pub struct TraceSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl TraceSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Append to (or create) a trace file
    pub fn open(path: &Path) -> WolochainResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    pub fn record(&self, operation: TraceOperation, key: &[u8], value: &[u8], height: u64) {
        let record = TraceRecord {
            operation,
            key: hex::encode(key),
            value: hex::encode(value),
            metadata: TraceMetadata {
                block_height: height,
            },
        };
        let mut writer = self.writer.lock();
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!("Failed to write store trace: {}", e);
        }
    }
}
