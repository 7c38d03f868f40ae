// crates/telemetry-ingest-core/src/runtime/reader.rs
// ============================================================================
// Module: Telemetry Ingest Log Readers
// Description: MCAP-backed and in-memory message logs.
// Purpose: Produce single-pass record sequences from recorded sessions.
// Dependencies: crate::{core, interfaces}, mcap
// ============================================================================

//! ## Overview
//! [`McapOpener`] opens MCAP files (or a bag directory holding one) and
//! validates the container before any record is produced. It keeps the last
//! container it read, so the registrar and dispatcher passes over one session
//! share a single buffer. [`McapLog`] streams records in physical order. A corrupt record mid-stream yields one
//! [`LogError::Format`] item and ends the sequence.
//!
//! [`MemoryLog`] and [`MemoryLogOpener`] implement the same contracts over
//! prepared records for tests and embedding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;

use mcap::MessageStream;

use crate::core::LogTimestamp;
use crate::core::TopicName;
use crate::interfaces::LogError;
use crate::interfaces::LogOpener;
use crate::interfaces::LogRecord;
use crate::interfaces::LogRecords;
use crate::interfaces::MessageLog;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Leading magic bytes of an MCAP container.
const MCAP_MAGIC: &[u8] = b"\x89MCAP0\r\n";

/// File extension of MCAP containers inside a bag directory.
const MCAP_EXTENSION: &str = "mcap";

// ============================================================================
// SECTION: MCAP Log
// ============================================================================

/// Opens MCAP recordings from disk.
///
/// Reopening an unchanged container reuses the buffer from the previous
/// read. A different path, size, or modification time reads the file again.
#[derive(Debug, Default)]
pub struct McapOpener {
    /// Most recently read container.
    cached: Mutex<Option<CachedContainer>>,
}

/// Container bytes with the file identity they were read under.
#[derive(Debug)]
struct CachedContainer {
    /// Resolved container file.
    path: PathBuf,
    /// File length at read time.
    len: u64,
    /// Modification time at read time, when the platform reports one.
    modified: Option<SystemTime>,
    /// Shared container bytes.
    bytes: Arc<[u8]>,
}

impl CachedContainer {
    /// Returns true when the entry still describes `path`.
    fn matches(&self, path: &Path, metadata: &fs::Metadata) -> bool {
        self.path == path && self.len == metadata.len() && self.modified == metadata.modified().ok()
    }
}

impl McapOpener {
    /// Creates an opener with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the container at `path`, sharing the cached buffer when the
    /// file is unchanged since the last read.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`McapLog::open`], plus [`LogError::Io`]
    /// when the cache lock is poisoned.
    pub fn open_log(&self, path: &Path) -> Result<McapLog, LogError> {
        let file = resolve_container(path)?;
        let metadata = fs::metadata(&file).map_err(|err| io_error(&file, &err))?;
        let mut cached =
            self.cached.lock().map_err(|_| LogError::Io("mcap cache mutex poisoned".to_string()))?;
        if let Some(entry) = cached.as_ref().filter(|entry| entry.matches(&file, &metadata)) {
            return McapLog::from_shared(file, Arc::clone(&entry.bytes));
        }
        let bytes: Arc<[u8]> = fs::read(&file).map_err(|err| io_error(&file, &err))?.into();
        let log = McapLog::from_shared(file.clone(), Arc::clone(&bytes))?;
        *cached = Some(CachedContainer {
            path: file,
            len: metadata.len(),
            modified: metadata.modified().ok(),
            bytes,
        });
        Ok(log)
    }
}

impl LogOpener for McapOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MessageLog>, LogError> {
        Ok(Box::new(self.open_log(path)?))
    }
}

/// MCAP recording held in memory for one pass.
#[derive(Debug)]
pub struct McapLog {
    /// Container file that was read.
    path: PathBuf,
    /// Raw container bytes, possibly shared with the opener cache.
    bytes: Arc<[u8]>,
    /// True once the record sequence was handed out.
    consumed: bool,
}

impl McapLog {
    /// Reads and validates the container at `path`.
    ///
    /// A directory is treated as a bag and resolved to the first `.mcap`
    /// file it contains, in name order.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotFound`] when the path does not exist,
    /// [`LogError::Io`] when it cannot be read, and [`LogError::Format`]
    /// when the content is not an MCAP container.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = resolve_container(path)?;
        let bytes = fs::read(&file).map_err(|err| io_error(&file, &err))?;
        Self::from_shared(file, bytes.into())
    }

    /// Wraps container bytes that were loaded elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Format`] when the bytes are not an MCAP container.
    pub fn from_bytes(path: PathBuf, bytes: Vec<u8>) -> Result<Self, LogError> {
        Self::from_shared(path, bytes.into())
    }

    /// Wraps a shared container buffer.
    fn from_shared(path: PathBuf, bytes: Arc<[u8]>) -> Result<Self, LogError> {
        if !bytes.starts_with(MCAP_MAGIC) {
            return Err(LogError::Format(format!("{} is not an mcap container", path.display())));
        }
        MessageStream::new(&bytes)
            .map_err(|err| LogError::Format(format!("{}: {err}", path.display())))?;
        Ok(Self {
            path,
            bytes,
            consumed: false,
        })
    }

    /// Returns the container file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageLog for McapLog {
    fn messages(&mut self) -> Result<LogRecords<'_>, LogError> {
        if self.consumed {
            return Err(LogError::Exhausted(self.path.display().to_string()));
        }
        self.consumed = true;
        let stream = MessageStream::new(&self.bytes)
            .map_err(|err| LogError::Format(format!("{}: {err}", self.path.display())))?;
        Ok(Box::new(McapRecords {
            stream,
            finished: false,
        }))
    }
}

/// Record iterator that stops after the first error.
struct McapRecords<'a> {
    /// Underlying MCAP message stream.
    stream: MessageStream<'a>,
    /// True once the stream ended or failed.
    finished: bool,
}

impl Iterator for McapRecords<'_> {
    type Item = Result<LogRecord, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = match self.stream.next() {
            None => {
                self.finished = true;
                return None;
            }
            Some(Err(err)) => Err(LogError::Format(err.to_string())),
            Some(Ok(message)) => match i64::try_from(message.log_time) {
                Ok(nanos) => Ok(LogRecord {
                    topic: TopicName::new(message.channel.topic.clone()),
                    type_name: message.channel.schema.as_ref().map(|schema| schema.name.clone()),
                    payload: message.data.into_owned(),
                    timestamp: LogTimestamp::from_nanos(nanos),
                }),
                Err(_) => Err(LogError::Format(format!(
                    "log time {} exceeds the signed nanosecond range",
                    message.log_time
                ))),
            },
        };
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }
}

/// Resolves a log path to the container file to read.
fn resolve_container(path: &Path) -> Result<PathBuf, LogError> {
    let metadata = fs::metadata(path).map_err(|err| io_error(path, &err))?;
    if !metadata.is_dir() {
        return Ok(path.to_path_buf());
    }
    let entries = fs::read_dir(path).map_err(|err| io_error(path, &err))?;
    let mut containers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| io_error(path, &err))?;
        let candidate = entry.path();
        if candidate.extension().is_some_and(|ext| ext == MCAP_EXTENSION) {
            containers.push(candidate);
        }
    }
    containers.sort();
    containers
        .into_iter()
        .next()
        .ok_or_else(|| LogError::NotFound(format!("no mcap file in {}", path.display())))
}

/// Maps an I/O error, separating missing paths from other failures.
fn io_error(path: &Path, err: &io::Error) -> LogError {
    if err.kind() == io::ErrorKind::NotFound {
        LogError::NotFound(path.display().to_string())
    } else {
        LogError::Io(format!("{}: {err}", path.display()))
    }
}

// ============================================================================
// SECTION: In-Memory Log
// ============================================================================

/// Prepared record sequence, optionally ending in an error.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    /// Items in read order.
    items: Vec<Result<LogRecord, LogError>>,
    /// True once the sequence was handed out.
    consumed: bool,
}

impl MemoryLog {
    /// Creates a log from records.
    #[must_use]
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self::from_items(records.into_iter().map(Ok).collect())
    }

    /// Creates a log from raw items, including read errors.
    #[must_use]
    pub const fn from_items(items: Vec<Result<LogRecord, LogError>>) -> Self {
        Self {
            items,
            consumed: false,
        }
    }
}

impl MessageLog for MemoryLog {
    fn messages(&mut self) -> Result<LogRecords<'_>, LogError> {
        if self.consumed {
            return Err(LogError::Exhausted("memory log".to_string()));
        }
        self.consumed = true;
        let items = std::mem::take(&mut self.items);
        let mut failed = false;
        Ok(Box::new(items.into_iter().take_while(move |item| {
            if failed {
                return false;
            }
            failed = item.is_err();
            true
        })))
    }
}

/// Opens prepared logs registered by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogOpener {
    /// Items per registered path.
    logs: BTreeMap<PathBuf, Vec<Result<LogRecord, LogError>>>,
}

impl MemoryLogOpener {
    /// Creates an opener with no logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers records under a path.
    #[must_use]
    pub fn with_log(mut self, path: impl Into<PathBuf>, records: Vec<LogRecord>) -> Self {
        self.logs.insert(path.into(), records.into_iter().map(Ok).collect());
        self
    }

    /// Registers raw items, including read errors, under a path.
    #[must_use]
    pub fn with_items(mut self, path: impl Into<PathBuf>, items: Vec<Result<LogRecord, LogError>>) -> Self {
        self.logs.insert(path.into(), items);
        self
    }
}

impl LogOpener for MemoryLogOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MessageLog>, LogError> {
        let items =
            self.logs.get(path).ok_or_else(|| LogError::NotFound(path.display().to_string()))?;
        Ok(Box::new(MemoryLog::from_items(items.clone())))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    fn record(nanos: i64) -> LogRecord {
        LogRecord {
            topic: TopicName::new("/t"),
            type_name: None,
            payload: Vec::new(),
            timestamp: LogTimestamp::from_nanos(nanos),
        }
    }

    #[test]
    fn memory_log_is_single_pass() {
        let mut log = MemoryLog::new(vec![record(1), record(2)]);
        assert_eq!(log.messages().expect("first pass").count(), 2);
        assert!(matches!(log.messages(), Err(LogError::Exhausted(_))));
    }

    #[test]
    fn memory_log_stops_after_error() {
        let mut log = MemoryLog::from_items(vec![
            Ok(record(1)),
            Err(LogError::Format("bad chunk".to_string())),
            Ok(record(3)),
        ]);
        let items: Vec<_> = log.messages().expect("pass").collect();
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = McapLog::open(&dir.path().join("absent.mcap")).expect_err("missing");
        assert!(matches!(err, LogError::NotFound(_)));
    }

    #[test]
    fn non_mcap_bytes_are_format_errors() {
        let err = McapLog::from_bytes(PathBuf::from("x.mcap"), b"not a log".to_vec())
            .expect_err("format");
        assert!(matches!(err, LogError::Format(_)));
    }

    fn put_record(buf: &mut Vec<u8>, opcode: u8, content: &[u8]) {
        buf.push(opcode);
        buf.extend_from_slice(&u64::try_from(content.len()).expect("len").to_le_bytes());
        buf.extend_from_slice(content);
    }

    /// Builds a container with no messages whose header names `library`.
    fn empty_container(library: &str) -> Vec<u8> {
        let mut bytes = MCAP_MAGIC.to_vec();
        let mut header = Vec::new();
        for field in ["ros2", library] {
            header.extend_from_slice(&u32::try_from(field.len()).expect("len").to_le_bytes());
            header.extend_from_slice(field.as_bytes());
        }
        put_record(&mut bytes, 0x01, &header);
        put_record(&mut bytes, 0x0F, &0_u32.to_le_bytes());
        put_record(&mut bytes, 0x02, &[0_u8; 20]);
        bytes.extend_from_slice(MCAP_MAGIC);
        bytes
    }

    #[test]
    fn opener_shares_buffer_across_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Hard_Course_1.mcap");
        fs::write(&path, empty_container("recorder")).expect("write");
        let opener = McapOpener::new();
        let mut first = opener.open_log(&path).expect("first pass");
        let mut second = opener.open_log(&path).expect("second pass");
        assert!(Arc::ptr_eq(&first.bytes, &second.bytes));
        assert_eq!(first.messages().expect("first").count(), 0);
        assert_eq!(second.messages().expect("second").count(), 0);
    }

    #[test]
    fn opener_rereads_rewritten_container() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Hard_Course_1.mcap");
        fs::write(&path, empty_container("recorder")).expect("write");
        let opener = McapOpener::new();
        let first = opener.open_log(&path).expect("first");
        let rewritten = empty_container("recorder-with-a-longer-name");
        fs::write(&path, &rewritten).expect("rewrite");
        let second = opener.open_log(&path).expect("second");
        assert!(!Arc::ptr_eq(&first.bytes, &second.bytes));
        assert_eq!(&*second.bytes, rewritten.as_slice());
    }

    #[test]
    fn memory_opener_reports_unknown_paths() {
        let opener = MemoryLogOpener::new().with_log("a.mcap", vec![record(1)]);
        assert!(opener.open(Path::new("a.mcap")).is_ok());
        assert!(matches!(opener.open(Path::new("b.mcap")), Err(LogError::NotFound(_))));
    }
}
