use std::fmt::Write;
use std::sync::Arc;

use spatialmesh_common::Transform;

use crate::mesh::SectorMesh;

/// Host-owned render surfaces that display committed sector meshes.
///
/// Surfaces are matched 1:1 with sectors by position in creation order. The
/// provider only displays meshes; it never mutates them. A mesh assigned to a
/// surface may be replaced or cleared between frames.
pub trait SurfaceProvider {
    /// Number of surfaces created so far.
    fn surface_count(&self) -> usize;

    /// Append a new surface under the given parent transform.
    fn create_surface(&mut self, name: &str, parent: &Transform);

    /// Point surface `index` at a mesh. `index` is always `< surface_count()`.
    fn assign_mesh(&mut self, index: usize, mesh: Arc<SectorMesh>);

    /// Show or hide every surface.
    fn set_visible(&mut self, visible: bool);

    /// Destroy all surfaces.
    fn clear_surfaces(&mut self);
}

/// A surface as recorded by [`DebugSurfaces`].
#[derive(Debug, Clone)]
pub struct DebugSurface {
    pub name: String,
    pub parent: Transform,
    pub mesh: Option<Arc<SectorMesh>>,
    pub visible: bool,
}

/// In-memory surface provider that records what a host renderer would display.
///
/// Useful for CLI output, logging, and testing the import pipeline without a GPU.
#[derive(Debug)]
pub struct DebugSurfaces {
    surfaces: Vec<DebugSurface>,
    visible: bool,
}

impl Default for DebugSurfaces {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
            visible: true,
        }
    }
}

impl DebugSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces(&self) -> &[DebugSurface] {
        &self.surfaces
    }

    pub fn get(&self, index: usize) -> Option<&DebugSurface> {
        self.surfaces.get(index)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Total triangles across all assigned meshes.
    pub fn triangle_count(&self) -> usize {
        self.surfaces
            .iter()
            .filter_map(|s| s.mesh.as_ref())
            .map(|m| m.triangle_count())
            .sum()
    }

    /// Human-readable listing of every surface and its mesh.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Surfaces (count={}, visible={}) ===",
            self.surfaces.len(),
            self.visible
        );
        for s in &self.surfaces {
            match &s.mesh {
                Some(mesh) => match mesh.bounds() {
                    Some(b) => {
                        let _ = writeln!(
                            out,
                            "  {} tris={} verts={} bounds=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
                            s.name,
                            mesh.triangle_count(),
                            mesh.vertex_count(),
                            b.min.x,
                            b.min.y,
                            b.min.z,
                            b.max.x,
                            b.max.y,
                            b.max.z
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  {} (empty)", s.name);
                    }
                },
                None => {
                    let _ = writeln!(out, "  {} (no mesh)", s.name);
                }
            }
        }
        out
    }
}

impl SurfaceProvider for DebugSurfaces {
    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn create_surface(&mut self, name: &str, parent: &Transform) {
        tracing::debug!(name, "creating surface");
        self.surfaces.push(DebugSurface {
            name: name.to_owned(),
            parent: *parent,
            mesh: None,
            visible: self.visible,
        });
    }

    fn assign_mesh(&mut self, index: usize, mesh: Arc<SectorMesh>) {
        if let Some(surface) = self.surfaces.get_mut(index) {
            surface.mesh = Some(mesh);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for s in &mut self.surfaces {
            s.visible = visible;
        }
    }

    fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }
}
