//! Rendering boundary: render-ready sector meshes and host render surfaces.
//!
//! # Invariants
//! - Surfaces cannot mutate sector meshes; they only hold shared handles.
//! - A mesh's derived data (normals, bounds) is recomputed on every rebuild.
//!
//! The `SurfaceProvider` trait is the seam to the host renderer. `DebugSurfaces`
//! is an in-memory implementation used by the CLI and tests.

mod mesh;
mod surface;

pub use mesh::{Aabb, GpuVertex, SectorMesh};
pub use surface::{DebugSurface, DebugSurfaces, SurfaceProvider};

pub fn crate_info() -> &'static str {
    "spatialmesh-render v0.1.0"
}
