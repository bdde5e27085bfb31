//! Directives the background monitor publishes for the loop to pick up.

use serde::{Deserialize, Serialize};

/// Coarse operating mode chosen from observed iteration latency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    #[default]
    Normal,
    /// Iterations are slow; skip optional per-iteration work.
    Reduced,
}

/// Runtime configuration store shared between the monitor (writer) and the
/// loop controller (reader at iteration boundaries).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDirectives {
    pub mode: PerformanceMode,
}

impl RuntimeDirectives {
    pub fn reduced() -> Self {
        Self {
            mode: PerformanceMode::Reduced,
        }
    }

    pub fn is_reduced(&self) -> bool {
        self.mode == PerformanceMode::Reduced
    }
}
