use std::sync::Arc;

use log::Logger;

use crate::config::Config;
use crate::snapshot::SnapshotStore;

/// Everything a request handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub snapshots: Arc<SnapshotStore>,
    pub config: Arc<Config>,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, snapshots: Arc<SnapshotStore>, config: Config) -> Self {
        Self {
            logger,
            snapshots,
            config: Arc::new(config),
        }
    }
}
