use std::time::Instant;

use crate::config::ImportConfig;

/// Shared import bookkeeping: whether a run is in flight and when the last one ended.
///
/// Only the importer mutates this; the scheduler reads it every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportState {
    pub is_import_active: bool,
    pub last_import: Instant,
}

impl ImportState {
    /// Idle, with the last import stamped at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            is_import_active: false,
            last_import: now,
        }
    }
}

impl Default for ImportState {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

/// Whether a new import run should start now.
///
/// True iff no run is active, periodic import is enabled, at least one period has
/// passed since the last run ended, and the scanner is actively scanning.
pub fn should_import(
    now: Instant,
    state: &ImportState,
    config: &ImportConfig,
    scanning: bool,
) -> bool {
    if state.is_import_active || !scanning {
        return false;
    }
    let Some(period) = config.import_period() else {
        return false;
    };
    now.saturating_duration_since(state.last_import) >= period
}
