//! Transcript change detection.
//!
//! Watches an append-only transcript file and surfaces the newest non-empty
//! line exactly once. Change detection is two-staged: a cheap modification-time
//! check debounces repeated polls, and a comparison against the last processed
//! line suppresses spurious timestamp changes (touch-without-write, or a
//! re-write of identical trailing content).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

/// Errors that can occur while polling the transcript.
///
/// A missing file is not an error (the transcriber may not have started yet);
/// it is handled internally. Anything else is a persistent I/O fault the
/// caller should treat as fatal rather than retry forever.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to read transcript {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// In-memory cursor over the transcript. Never persisted; a process restart
/// always begins with a clean state.
#[derive(Debug, Clone, Default)]
pub struct WatchState {
    /// Modification time observed at the last successful poll.
    pub last_modified: Option<SystemTime>,
    /// The last line that was handed to the dispatcher.
    pub last_processed_line: String,
}

/// Polls a transcript file for newly appended utterances.
///
/// Owns the [`WatchState`] exclusively. State is updated *before* a new
/// utterance is returned, so a slow downstream dispatch can never cause the
/// same line to be produced twice.
pub struct TranscriptWatcher {
    path: PathBuf,
    state: WatchState,
}

impl TranscriptWatcher {
    /// Creates a watcher for the given transcript path with an empty cursor.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: WatchState::default(),
        }
    }

    /// The path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Performs one poll cycle.
    ///
    /// Returns `Ok(Some(line))` when a new utterance is available, `Ok(None)`
    /// when the file is absent, unchanged, empty, or its last line was already
    /// processed. The read is a bounded synchronous full re-read; the file is
    /// assumed to stay small.
    pub fn poll(&mut self) -> Result<Option<String>, WatchError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "transcript not present yet");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let modified = metadata.modified().map_err(|e| self.io_error(e))?;
        if self.state.last_modified == Some(modified) {
            return Ok(None);
        }
        self.state.last_modified = Some(modified);

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            // The file can disappear between the metadata check and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let latest = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .next_back();

        match latest {
            Some(line) if line != self.state.last_processed_line => {
                self.state.last_processed_line = line.to_string();
                debug!(line = %line, "new utterance detected");
                Ok(Some(line.to_string()))
            }
            _ => Ok(None),
        }
    }

    fn io_error(&self, source: std::io::Error) -> WatchError {
        WatchError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Overwrites the file and pins its mtime to a known offset so each
    /// change is observable regardless of filesystem timestamp granularity.
    fn write_at(dir: &TempDir, name: &str, contents: &str, offset_secs: u64) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        bump_mtime(&path, offset_secs);
        path
    }

    fn bump_mtime(path: &Path, offset_secs: u64) {
        let file = OpenOptions::new().append(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + offset_secs))
            .unwrap();
    }

    fn append(path: &Path, line: &str, offset_secs: u64) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        writeln!(file, "{line}").unwrap();
        bump_mtime(path, offset_secs);
    }

    #[test]
    fn missing_file_produces_nothing() {
        let dir = TempDir::new().unwrap();
        let mut watcher = TranscriptWatcher::new(dir.path().join("transcriptions.txt"));
        assert!(watcher.poll().unwrap().is_none());
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn first_poll_yields_last_non_empty_line() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "hello\n\n  I'm thirsty  \n\n", 1);
        let mut watcher = TranscriptWatcher::new(path);
        assert_eq!(watcher.poll().unwrap().as_deref(), Some("I'm thirsty"));
    }

    #[test]
    fn repolling_without_change_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "I'm thirsty\n", 1);
        let mut watcher = TranscriptWatcher::new(path);
        assert!(watcher.poll().unwrap().is_some());
        assert!(watcher.poll().unwrap().is_none());
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn appended_line_is_produced_exactly_once() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "hello there\n", 1);
        let mut watcher = TranscriptWatcher::new(path.clone());
        assert_eq!(watcher.poll().unwrap().as_deref(), Some("hello there"));

        append(&path, "I need a drink", 2);
        assert_eq!(watcher.poll().unwrap().as_deref(), Some("I need a drink"));
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn touch_without_write_is_suppressed() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "I'm parched\n", 1);
        let mut watcher = TranscriptWatcher::new(path.clone());
        assert!(watcher.poll().unwrap().is_some());

        // mtime changes, content does not.
        bump_mtime(&path, 2);
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn identical_trailing_line_is_suppressed() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "give me water\n", 1);
        let mut watcher = TranscriptWatcher::new(path.clone());
        assert!(watcher.poll().unwrap().is_some());

        // Rewritten with the same trailing content under a new mtime.
        write_at(&dir, "t.txt", "padding\ngive me water\n", 2);
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn non_notfound_io_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        // Metadata succeeds on a directory, the content read does not.
        let mut watcher = TranscriptWatcher::new(dir.path());
        let err = watcher.poll().unwrap_err();
        assert!(matches!(err, WatchError::Io { .. }));
    }

    #[test]
    fn blank_only_file_produces_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_at(&dir, "t.txt", "\n   \n\n", 1);
        let mut watcher = TranscriptWatcher::new(path);
        assert!(watcher.poll().unwrap().is_none());
    }
}
