//! Append-only newline-delimited JSON log writer.
//!
//! Both `edge_rule.log` (rule engine persistence, §4.7) and `uplink.log`
//! (fan-out send results, §4.8) use this: one atomic append per line, never
//! rotated or truncated by the gateway itself.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

pub struct NdjsonLog {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl NdjsonLog {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes `record` and appends it as a single line. Failures are
    /// logged, never propagated — persistence is best-effort.
    pub fn append(&self, record: &impl Serialize) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("ndjson encode failed for {}: {e}", self.path.display());
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!("ndjson append failed for {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let log = NdjsonLog::open(&path).unwrap();
        log.append(&json!({"a": 1}));
        log.append(&json!({"a": 2}));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
