use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ty::Type;
use crate::value::Value;

/// Event ids are monotonic per source within a partition.
pub const INVALID_ID: u64 = u64::MAX;
pub const MAX_EVENTS: u64 = u64::MAX - 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    #[serde(rename = "type")]
    pub ty: Arc<Type>,
    pub value: Value,
}

impl Event {
    pub fn new(id: u64, ty: Arc<Type>, value: Value) -> Self {
        Self { id, ty, value }
    }
}
