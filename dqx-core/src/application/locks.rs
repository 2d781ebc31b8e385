// dqx-core/src/application/locks.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::DqxError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};

/// Per-script mutual exclusion inside one process.
///
/// Populate, publish and delete of the same script id run one at a time;
/// different ids never wait on each other. Lanes outlive their script: a
/// caller still queued behind a delete must share the lane with anyone who
/// arrives later for the same id.
#[derive(Default)]
pub struct ScriptLocks {
    lanes: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ScriptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lane for `script_id`. Lock the returned mutex for the duration of
    /// the operation.
    pub fn lane(&self, script_id: i64) -> Result<Arc<Mutex<()>>, DqxError> {
        let mut lanes = self.lanes.lock().map_err(|_| poisoned("script lock table"))?;
        Ok(Arc::clone(lanes.entry(script_id).or_default()))
    }
}

pub fn hold(lane: &Mutex<()>) -> Result<MutexGuard<'_, ()>, DqxError> {
    lane.lock().map_err(|_| poisoned("script lane"))
}

fn poisoned(what: &str) -> DqxError {
    DqxError::Infrastructure(InfrastructureError::Database(DatabaseError::Poisoned(
        what.to_string(),
    )))
}
