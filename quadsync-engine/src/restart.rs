//! Restart planning — which units to try-restart after a pass.
//!
//! Only quadlet destinations map to units; companion files are mirrored but
//! never restart anything.

use std::collections::BTreeSet;

use quadsync_core::config::RestartPolicy;
use quadsync_core::quadlet;

use crate::plan::Plan;
use crate::state::Manifest;

/// Derive the deduplicated set of unit names to try-restart.
///
/// `manifest` must be the post-apply manifest so `all-managed` reflects what
/// is actually on disk.
pub fn restart_set(policy: RestartPolicy, plan: &Plan, manifest: &Manifest) -> BTreeSet<String> {
    match policy {
        RestartPolicy::None => BTreeSet::new(),
        RestartPolicy::Changed => plan
            .ops()
            .filter_map(|op| quadlet::unit_name(&op.dest_path))
            .collect(),
        RestartPolicy::AllManaged => manifest
            .managed_files
            .keys()
            .filter_map(|dest| quadlet::unit_name(dest))
            .collect(),
    }
}
