//! External audit sinks
//!
//! The trail itself is process-lifetime only. A sink mirrors each appended
//! record to durable storage when one is wired in.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::audit::AuditRecord;
use crate::error::Result;

pub trait AuditSink: Send + Sync {
    /// Called once per record, in sequence order.
    fn write(&self, record: &AuditRecord) -> Result<()>;
}

/// One JSON document per line, appended to a file
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in a sink file.
    ///
    /// Sequence numbers restart with each process, so a file shared across
    /// runs holds one ascending run per process.
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<AuditRecord>> {
        let content = fs::read_to_string(path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}

impl AuditSink for JsonlAuditSink {
    fn write(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::audit::{Outcome, RiskLevel};
    use chrono::Utc;

    #[test]
    fn test_jsonl_sink_appends_lines() {
        let path = std::env::temp_dir()
            .join(format!("roadiq-sink-{}", uuid::Uuid::new_v4()))
            .join("audit.jsonl");
        let sink = JsonlAuditSink::open(&path).unwrap();

        for sequence in 1..=2 {
            sink.write(&AuditRecord {
                sequence,
                timestamp: Utc::now(),
                actor: "DataAgent".into(),
                action: "read_sensor_data".into(),
                resource: "vehicle_V001".into(),
                outcome: Outcome::Allowed,
                risk_level: RiskLevel::Low,
                alert: None,
            })
            .unwrap();
        }

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: AuditRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.sequence, 2);

        let replayed = JsonlAuditSink::read_all(&path).unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].actor, "DataAgent");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
