//! Local job history, backed by SQLite.
//!
//! Every completed ingestion or query job appends one row; the `status`
//! command surfaces a summary.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS job_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    kind TEXT NOT NULL,
    duration_ms INTEGER NOT NULL,
    success INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_log_timestamp ON job_log(timestamp);
"#;

pub struct JobLog {
    conn: Connection,
}

impl JobLog {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Default location under the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("siteqa").join("jobs.db"))
    }

    pub fn record(&self, kind: &str, duration_ms: u64, success: bool) {
        let _ = self.conn.execute(
            "INSERT INTO job_log (timestamp, kind, duration_ms, success)
             VALUES (datetime('now'), ?1, ?2, ?3)",
            params![kind, duration_ms as i64, success as i32],
        );
    }

    pub fn summary(&self, retention_days: u32) -> JobLogSummary {
        let query = format!(
            r#"
            SELECT
                COUNT(*) as total_jobs,
                COALESCE(AVG(duration_ms), 0) as avg_duration_ms,
                COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END) * 100.0 / NULLIF(COUNT(*), 0), 0) as failure_rate
            FROM job_log
            WHERE timestamp >= datetime('now', '-{} days')
            "#,
            retention_days
        );

        self.conn
            .query_row(&query, [], |row| {
                Ok(JobLogSummary {
                    total_jobs: row.get::<_, i64>(0)? as u64,
                    avg_duration_ms: row.get::<_, f64>(1)? as u64,
                    failure_rate: row.get::<_, f64>(2)? as f32,
                })
            })
            .unwrap_or_default()
    }

    pub fn cleanup(&self, retention_days: u32) {
        let query = format!(
            "DELETE FROM job_log WHERE timestamp < datetime('now', '-{} days')",
            retention_days
        );
        let _ = self.conn.execute(&query, []);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobLogSummary {
    pub total_jobs: u64,
    pub avg_duration_ms: u64,
    pub failure_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summarize() {
        let dir = tempfile::tempdir().unwrap();
        let log = JobLog::open(&dir.path().join("jobs.db")).unwrap();

        log.record("ingestion", 1200, true);
        log.record("query", 300, true);
        log.record("batch_query", 900, false);

        let summary = log.summary(7);
        assert_eq!(summary.total_jobs, 3);
        assert_eq!(summary.avg_duration_ms, 800);
        assert!((summary.failure_rate - 100.0 / 3.0).abs() < 0.1);
    }

    #[test]
    fn test_empty_log_summary_is_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let log = JobLog::open(&dir.path().join("jobs.db")).unwrap();

        let summary = log.summary(7);
        assert_eq!(summary.total_jobs, 0);
        assert_eq!(summary.failure_rate, 0.0);
    }
}
