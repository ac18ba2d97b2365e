//! Keyed lanes that serialise operations on the same cart line.
//!
//! Operations on different keys run concurrently. A lane exists only while
//! someone holds or waits for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

type Lane = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone, Default)]
pub struct LineLanes {
    lanes: Arc<Mutex<HashMap<String, Lane>>>,
}

/// Held for the duration of one operation; frees the lane on drop.
pub struct LaneGuard {
    key: String,
    lanes: LineLanes,
    _turn: OwnedMutexGuard<()>,
}

impl LineLanes {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Lane>> {
        self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Waits for the lane `key`. `None` keys never wait.
    pub async fn acquire(&self, key: Option<String>) -> Option<LaneGuard> {
        let key = key?;
        let lane = self.table().entry(key.clone()).or_default().clone();
        let turn = lane.lock_owned().await;
        Some(LaneGuard {
            key,
            lanes: self.clone(),
            _turn: turn,
        })
    }

    /// Number of lanes currently held or waited on.
    pub fn active(&self) -> usize {
        self.table().len()
    }
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        let mut table = self.lanes.table();
        // The table and this guard hold the only references: nobody waits.
        let idle = table
            .get(&self.key)
            .is_some_and(|lane| Arc::strong_count(lane) <= 2);
        if idle {
            table.remove(&self.key);
        }
    }
}

/// Lane key for operations addressed by line id.
pub fn line_lane(line: &crate::model::LineId) -> String {
    format!("line:{line}")
}
