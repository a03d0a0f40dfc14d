use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;

/// Capability bundle passed down to components instead of reached for
/// through process-wide globals (spec §9: "global mutable state →
/// explicit context"). `accountant` is generic over whatever handle the
/// embedding binary uses to reach the accountant actor (an mpsc sender in
/// this workspace); it is `None` in tests and in components run without
/// telemetry.
#[derive(Clone)]
pub struct Context<A = ()> {
    pub config: Arc<Config>,
    pub accountant: Option<A>,
}

impl<A> Context<A> {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            accountant: None,
        }
    }

    pub fn with_accountant(mut self, accountant: A) -> Self {
        self.accountant = Some(accountant);
        self
    }

    pub fn root_dir(&self) -> PathBuf {
        self.config.dir_path()
    }
}
