//! Shared types: sector keys, raw mesh buffers, transforms.
//!
//! # Invariants
//! - A `SectorKey` is the floor of a point; equality and hashing are structural.
//! - A validated `RawMeshBuffer` only holds whole triangles with in-range indices.

mod buffer;
mod types;

pub use buffer::{BufferError, RawMeshBuffer};
pub use types::{SectorKey, Transform};

pub fn crate_info() -> &'static str {
    "spatialmesh-common v0.1.0"
}
