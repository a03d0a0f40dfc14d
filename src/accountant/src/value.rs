use std::fmt;
use std::time::Duration;

/// One metric value. Durations and time-points are always rendered as
/// integer microseconds; doubles as 6 significant digits.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Str(String),
    Duration(Duration),
    /// Microseconds since the Unix epoch.
    Time(i64),
    I64(i64),
    U64(u64),
    F64(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Str(s) => write!(f, "{s}"),
            MetricValue::Duration(d) => write!(f, "{}", d.as_micros()),
            MetricValue::Time(t) => write!(f, "{t}"),
            MetricValue::I64(v) => write!(f, "{v}"),
            MetricValue::U64(v) => write!(f, "{v}"),
            MetricValue::F64(v) => write!(f, "{v:.6}"),
        }
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Str(v)
    }
}
impl From<Duration> for MetricValue {
    fn from(v: Duration) -> Self {
        MetricValue::Duration(v)
    }
}
impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::I64(v)
    }
}
impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::U64(v)
    }
}
impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::F64(v)
    }
}

/// A batch of `(key, value)` pairs recorded as one row each, in order.
pub type Report = Vec<(String, MetricValue)>;

/// One entry of a performance report: an event count over a duration,
/// expanded into three rows (`.events`, `.duration`, `.rate`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    pub events: u64,
    pub duration: Duration,
}

pub type PerformanceReport = Vec<(String, PerformanceSample)>;
