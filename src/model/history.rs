//! Revision bookkeeping for the mirror's line list.
//!
//! Every merge advances the revision. A reply is folded in against the
//! revision its request started from, so lines that entered or left the
//! mirror after that point are not undone by an older view of the cart.

use super::line::{LineId, LineOverlay};
use std::collections::HashMap;

/// Departed lines remembered for late replies and reappearing ids.
const DEPARTED_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq)]
struct Departure {
    revision: u64,
    overlay: LineOverlay,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineHistory {
    revision: u64,
    arrived: HashMap<LineId, u64>,
    departed: HashMap<LineId, Departure>,
}

impl LineHistory {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Opens the next revision and returns it.
    pub fn advance(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Whether `line` entered the mirror after `basis`.
    pub fn arrived_after(&self, line: &LineId, basis: u64) -> bool {
        self.arrived.get(line).is_some_and(|&revision| revision > basis)
    }

    /// Whether `line` left the mirror after `basis`.
    pub fn departed_after(&self, line: &LineId, basis: u64) -> bool {
        self.departed
            .get(line)
            .is_some_and(|departure| departure.revision > basis)
    }

    /// Records `line` entering the mirror. Returns the overlay it carried
    /// when it last left, if it is coming back.
    pub fn arrive(&mut self, line: &LineId, revision: u64) -> Option<LineOverlay> {
        self.arrived.insert(line.clone(), revision);
        self.departed.remove(line).map(|departure| departure.overlay)
    }

    pub fn depart(&mut self, line: &LineId, overlay: LineOverlay, revision: u64) {
        self.arrived.remove(line);
        self.departed
            .insert(line.clone(), Departure { revision, overlay });
        if self.departed.len() > DEPARTED_LIMIT {
            let oldest = self
                .departed
                .iter()
                .min_by_key(|(_, departure)| departure.revision)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                self.departed.remove(&oldest);
            }
        }
    }
}
