use crate::config::Config;

/// Bootstraps `env_logger` with a default filter derived from the node
/// id, mirroring the teacher's process-wide logger init. Safe to call
/// more than once; later calls are no-ops.
pub fn init_from_config(config: &Config) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_micros()
    .is_test(false)
    .try_init();
    log::debug!("logging initialized for node {}", config.id);
}
