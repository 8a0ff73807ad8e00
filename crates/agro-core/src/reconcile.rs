//! # Crop Reconciliation
//!
//! Computes the minimal association changes that turn a producer's current
//! crop set into a requested one.
//!
//! ```text
//!   current:   { X, Y }          requested: { Y, Z }
//!
//!   to_remove = current − requested   = { X }   (association rows deleted)
//!   to_add    = requested − current   = { Z }   (association rows inserted)
//!   untouched = current ∩ requested   = { Y }   (row id preserved)
//! ```

use std::collections::HashSet;

use crate::types::{Crop, ProducerCrop};

/// Association changes for one update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropChanges {
    /// Association ids to delete.
    pub to_remove: Vec<String>,
    /// Crops to associate.
    pub to_add: Vec<Crop>,
}

impl CropChanges {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Diffs `current` associations against the `requested` (already resolved) crops.
///
/// Sets are keyed by crop id. A crop listed twice in `requested` is added once.
pub fn plan_crop_changes(current: &[ProducerCrop], requested: &[Crop]) -> CropChanges {
    let requested_ids: HashSet<&str> = requested.iter().map(|crop| crop.id.as_str()).collect();
    let current_ids: HashSet<&str> = current
        .iter()
        .map(|association| association.crop.id.as_str())
        .collect();

    let to_remove = current
        .iter()
        .filter(|association| !requested_ids.contains(association.crop.id.as_str()))
        .map(|association| association.id.clone())
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut to_add = Vec::new();
    for crop in requested {
        if !current_ids.contains(crop.id.as_str()) && seen.insert(crop.id.as_str()) {
            to_add.push(crop.clone());
        }
    }

    CropChanges { to_remove, to_add }
}

// =============================================================================
// Unit Tests
// =============================================================================
