//! Developer Tooling: sector map inspector and summaries.
//!
//! # Invariants
//! - Tools are read-only; they never mutate sectors.

mod inspector;

pub use inspector::{SectorInfo, SectorInspector, SectorMapSummary};

pub fn crate_info() -> &'static str {
    "spatialmesh-tools v0.1.0"
}
