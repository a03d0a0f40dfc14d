use std::path::PathBuf;

use dotenv_config::EnvConfig;

/// The plain configuration record the core consumes, per the spec's
/// external-interfaces section. CLI parsing and file-based bootstrap
/// live outside this crate; `Config` is data only.
#[derive(Debug, Clone, EnvConfig, PartialEq)]
pub struct Config {
    /// Node name, used as a human-readable actor label by the accountant.
    #[env_config(name = "VAST_ID", default = "vast-node")]
    pub id: String,
    /// Root directory under which `ingest/`, `partitions/`, and the
    /// accountant log all live.
    #[env_config(name = "VAST_DIR", default = "./vast-db")]
    pub dir: String,
    /// Number of events forwarded to indexers per ingest batch.
    #[env_config(name = "VAST_BATCH_SIZE", default = 1024)]
    pub batch_size: usize,
    /// Segmentizer chunk bound.
    #[env_config(name = "VAST_MAX_EVENTS_PER_CHUNK", default = 8192)]
    pub max_events_per_chunk: usize,
    /// Segmentizer segment byte bound.
    #[env_config(name = "VAST_MAX_SEGMENT_SIZE", default = 134_217_728)]
    pub max_segment_size: usize,
    /// Table slice size used when batching record-shaped values.
    #[env_config(name = "VAST_TABLE_SLICE_SIZE", default = 1024)]
    pub table_slice_size: usize,
    /// How often (seconds) components should emit telemetry samples.
    #[env_config(name = "VAST_TELEMETRY_RATE", default = 1)]
    pub telemetry_rate: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "vast-node".to_string(),
            dir: "./vast-db".to_string(),
            batch_size: 1024,
            max_events_per_chunk: 8192,
            max_segment_size: 128 * 1024 * 1024,
            table_slice_size: 1024,
            telemetry_rate: 1,
        }
    }
}

impl Config {
    /// Loads overrides from a `.env` file and `VAST_*` environment
    /// variables on top of [`Config::default`], mirroring the teacher's
    /// `dotenvy::dotenv_override` + `EnvConfig::init` bootstrap. Falls
    /// back to the default record if parsing fails, since config
    /// bootstrap proper is out of scope for this crate.
    pub fn from_env() -> Self {
        dotenvy::dotenv_override().ok();
        Self::init().unwrap_or_default()
    }

    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    pub fn ingest_segments_dir(&self) -> PathBuf {
        self.dir_path().join("ingest").join("segments")
    }

    pub fn partitions_dir(&self) -> PathBuf {
        self.dir_path().join("partitions")
    }

    pub fn accountant_log_path(&self) -> PathBuf {
        self.dir_path().join("accountant.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.max_events_per_chunk, 8192);
        assert!(cfg.max_segment_size > cfg.max_events_per_chunk);
    }

    #[test]
    fn env_override_batch_size() {
        unsafe {
            std::env::set_var("VAST_BATCH_SIZE", "42");
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.batch_size, 42);
        unsafe {
            std::env::remove_var("VAST_BATCH_SIZE");
        }
    }
}
