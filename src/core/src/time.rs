use chrono::{DateTime, Utc};

/// Current time as microseconds since the Unix epoch, the unit every
/// timestamp in the accountant log and in partition metadata is stored in.
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub fn micros_to_datetime(us: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(us).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

/// Converts a signed duration (seconds + nanosecond fraction) into the
/// integer microsecond count the accountant and time-indexer both use.
pub fn duration_to_micros(secs: i64, nanos: i32) -> i64 {
    secs * 1_000_000 + (nanos as i64) / 1_000
}
