use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::value::{MetricValue, PerformanceReport, Report};

/// Senders are identified by an opaque id the caller assigns (there is
/// no process-wide actor registry to draw one from, see DESIGN.md).
pub type SenderId = u64;

#[derive(Debug)]
pub enum AccountantMessage {
    Announce { sender: SenderId, name: String },
    /// Cleans up `actor_map` for a sender that is going away. Stands in
    /// for the DOWN-handler in the original actor system.
    Forget { sender: SenderId },
    Record { sender: SenderId, key: String, value: MetricValue },
    Report { sender: SenderId, report: Report },
    PerformanceReport { sender: SenderId, report: PerformanceReport },
    Flush,
    Status { reply: oneshot::Sender<AccountantStatus> },
}

#[derive(Debug, Clone)]
pub struct AccountantStatus {
    pub known_actors: HashMap<SenderId, String>,
    pub file_healthy: bool,
    pub flush_pending: bool,
}
