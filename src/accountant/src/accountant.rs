use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use snafu::ResultExt;
use tokio::sync::mpsc;

use vast_core::errors::{Error, FilesystemSnafu};

use crate::message::{AccountantMessage, AccountantStatus, SenderId};
use crate::value::MetricValue;

const HEADER: &str = "host\tpid\taid\tkey\tvalue\n";
const FLUSH_DELAY: Duration = Duration::from_secs(10);

/// The single writer to the process's metrics log. One row
/// per `(key, value)`, tab-separated, never rewritten.
pub struct Accountant {
    file: File,
    path: PathBuf,
    host_id: [u8; 16],
    pid: u32,
    actor_map: HashMap<SenderId, String>,
    flush_pending: bool,
    healthy: bool,
}

impl Accountant {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context(FilesystemSnafu { path: parent.to_path_buf() })?;
            }
        }
        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(FilesystemSnafu { path: path.clone() })?;
        if is_new {
            file.write_all(HEADER.as_bytes()).context(FilesystemSnafu { path: path.clone() })?;
        }
        Ok(Self {
            file,
            path,
            host_id: *uuid::Uuid::new_v4().as_bytes(),
            pid: std::process::id(),
            actor_map: HashMap::new(),
            flush_pending: false,
            healthy: true,
        })
    }

    fn name_of(&self, sender: SenderId) -> &str {
        self.actor_map.get(&sender).map(String::as_str).unwrap_or("")
    }

    fn write_row(&mut self, sender: SenderId, key: &str, value: &MetricValue) {
        let mut row = String::new();
        for byte in self.host_id {
            row.push_str(&byte.to_string());
        }
        row.push('\t');
        row.push_str(&self.pid.to_string());
        row.push('\t');
        row.push_str(&sender.to_string());
        row.push('\t');
        row.push_str(self.name_of(sender));
        row.push('\t');
        row.push_str(key);
        row.push('\t');
        row.push_str(&value.to_string());
        row.push('\n');
        if let Err(err) = self.file.write_all(row.as_bytes()) {
            log::error!("accountant write to {} failed: {err}", self.path.display());
            self.healthy = false;
        }
    }

    fn record(&mut self, sender: SenderId, key: &str, value: &MetricValue) {
        self.write_row(sender, key, value);
    }

    fn record_performance(&mut self, sender: SenderId, key: &str, events: u64, duration: Duration) {
        let us = duration.as_micros().max(1) as u64;
        let rate = events.saturating_mul(1_000_000) / us;
        self.record(sender, &format!("{key}.events"), &MetricValue::U64(events));
        self.record(sender, &format!("{key}.duration"), &MetricValue::U64(us));
        self.record(sender, &format!("{key}.rate"), &MetricValue::U64(rate));
    }

    fn flush(&mut self) {
        if self.healthy {
            if let Err(err) = self.file.flush() {
                log::error!("accountant flush of {} failed: {err}", self.path.display());
                self.healthy = false;
            }
        }
        self.flush_pending = false;
    }

    fn status(&self) -> AccountantStatus {
        AccountantStatus {
            known_actors: self.actor_map.clone(),
            file_healthy: self.healthy,
            flush_pending: self.flush_pending,
        }
    }

    /// Runs the mailbox loop until `inbox` closes. `outbox` is used to
    /// schedule the at-most-once-per-10s delayed flush.
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<AccountantMessage>,
        outbox: mpsc::Sender<AccountantMessage>,
    ) {
        while let Some(message) = inbox.recv().await {
            match message {
                AccountantMessage::Announce { sender, name } => {
                    self.actor_map.insert(sender, name);
                }
                AccountantMessage::Forget { sender } => {
                    self.actor_map.remove(&sender);
                }
                AccountantMessage::Record { sender, key, value } => {
                    self.record(sender, &key, &value);
                    self.schedule_flush(&outbox);
                }
                AccountantMessage::Report { sender, report } => {
                    for (key, value) in &report {
                        self.record(sender, key, value);
                    }
                    if !report.is_empty() {
                        self.schedule_flush(&outbox);
                    }
                }
                AccountantMessage::PerformanceReport { sender, report } => {
                    for (key, sample) in &report {
                        self.record_performance(sender, key, sample.events, sample.duration);
                    }
                    if !report.is_empty() {
                        self.schedule_flush(&outbox);
                    }
                }
                AccountantMessage::Flush => self.flush(),
                AccountantMessage::Status { reply } => {
                    let _ = reply.send(self.status());
                }
            }
        }
    }

    fn schedule_flush(&mut self, outbox: &mpsc::Sender<AccountantMessage>) {
        if self.flush_pending {
            return;
        }
        self.flush_pending = true;
        let outbox = outbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(FLUSH_DELAY).await;
            let _ = outbox.send(AccountantMessage::Flush).await;
        });
    }
}

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join("accountant.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_file(path: &Path) -> String {
        let mut contents = String::new();
        File::open(path).unwrap().read_to_string(&mut contents).unwrap();
        contents
    }

    #[tokio::test]
    async fn header_is_written_once_and_rows_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_path(dir.path());
        let accountant = Accountant::open(&path).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(accountant.run(rx, tx.clone()));

        tx.send(AccountantMessage::Announce { sender: 1, name: "importer".to_string() })
            .await
            .unwrap();
        tx.send(AccountantMessage::Record {
            sender: 1,
            key: "events".to_string(),
            value: MetricValue::I64(42),
        })
        .await
        .unwrap();
        tx.send(AccountantMessage::Flush).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let contents = read_file(&path);
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "host\tpid\taid\tkey\tvalue");
        let row = lines.next().unwrap();
        let fields: Vec<&str> = row.split('\t').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[2], "1");
        assert_eq!(fields[3], "importer");
        assert_eq!(fields[4], "events");
        assert_eq!(fields[5], "42");
    }

    #[tokio::test]
    async fn performance_report_expands_to_three_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_path(dir.path());
        let accountant = Accountant::open(&path).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(accountant.run(rx, tx.clone()));

        tx.send(AccountantMessage::PerformanceReport {
            sender: 2,
            report: vec![(
                "ingest".to_string(),
                crate::value::PerformanceSample { events: 2_000, duration: Duration::from_secs(1) },
            )],
        })
        .await
        .unwrap();
        tx.send(AccountantMessage::Flush).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let contents = read_file(&path);
        let keys: Vec<&str> =
            contents.lines().skip(1).map(|line| line.split('\t').nth(4).unwrap()).collect();
        assert_eq!(keys, vec!["ingest.events", "ingest.duration", "ingest.rate"]);
    }

    #[tokio::test]
    async fn status_reports_known_actors() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_path(dir.path());
        let accountant = Accountant::open(&path).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(accountant.run(rx, tx.clone()));

        tx.send(AccountantMessage::Announce { sender: 9, name: "disk-monitor".to_string() })
            .await
            .unwrap();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        tx.send(AccountantMessage::Status { reply: reply_tx }).await.unwrap();
        let status = reply_rx.await.unwrap();
        assert_eq!(status.known_actors.get(&9).map(String::as_str), Some("disk-monitor"));
        assert!(status.file_healthy);

        drop(tx);
        handle.await.unwrap();
    }
}
