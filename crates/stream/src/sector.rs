use std::sync::Arc;

use glam::Vec3;
use spatialmesh_render::SectorMesh;

/// Errors from adding geometry to a sector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectorError {
    #[error("sector holds {vertices} vertices; adding a triangle would exceed the 16-bit index range")]
    CapacityExceeded { vertices: usize },
}

/// Append-only triangle collector for one grid cell.
///
/// Every triangle contributes three fresh vertex slots; vertices are never shared.
/// The sector exclusively owns one render-ready mesh, rebuilt on [`MeshSector::commit`].
#[derive(Debug, Default)]
pub struct MeshSector {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    mesh: Arc<SectorMesh>,
}

impl MeshSector {
    /// Hard vertex cap, matching a 16-bit index space.
    pub const MAX_VERTICES: usize = 65_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the collected geometry. The committed mesh is left untouched.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Append one triangle, or reject it if it would push the sector past the cap.
    ///
    /// A rejected triangle leaves the sector unchanged.
    pub fn add_triangle(&mut self, p1: Vec3, p2: Vec3, p3: Vec3) -> Result<(), SectorError> {
        if self.vertices.len() + 3 > Self::MAX_VERTICES {
            return Err(SectorError::CapacityExceeded {
                vertices: self.vertices.len(),
            });
        }
        for p in [p1, p2, p3] {
            self.indices.push(self.vertices.len() as u32);
            self.vertices.push(p);
        }
        Ok(())
    }

    /// Rebuild the owned mesh from the collected geometry.
    ///
    /// A sector with fewer than three vertices commits to an empty mesh.
    pub fn commit(&mut self) {
        let mesh = Arc::make_mut(&mut self.mesh);
        mesh.clear();
        if self.vertices.len() > 2 {
            mesh.set_geometry(&self.vertices, &self.indices);
            mesh.recalculate_normals();
            mesh.recalculate_bounds();
        }
    }

    /// Shared handle to the last committed mesh.
    pub fn mesh(&self) -> &Arc<SectorMesh> {
        &self.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_triangle_appends_fresh_slots() {
        let mut sector = MeshSector::new();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();

        assert_eq!(sector.vertex_count(), 6);
        assert_eq!(sector.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(sector.triangle_count(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut sector = MeshSector::new();
        while sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_ok() {}

        // Whole triangles only: the last slot short of the cap stays empty.
        let full = sector.vertex_count();
        assert_eq!(full, 64_998);
        assert!(full <= MeshSector::MAX_VERTICES);

        let err = sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(err, Err(SectorError::CapacityExceeded { vertices: full }));
        assert_eq!(sector.vertex_count(), full);
    }

    #[test]
    fn reset_keeps_committed_mesh() {
        let mut sector = MeshSector::new();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        sector.commit();
        sector.reset();

        assert!(sector.is_empty());
        assert_eq!(sector.mesh().triangle_count(), 1);
    }

    #[test]
    fn empty_sector_commits_to_empty_mesh() {
        let mut sector = MeshSector::new();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        sector.commit();
        assert!(!sector.mesh().is_empty());

        sector.reset();
        sector.commit();
        assert!(sector.mesh().is_empty());
        assert!(sector.mesh().bounds().is_none());
    }

    #[test]
    fn commit_computes_derived_geometry() {
        let mut sector = MeshSector::new();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        sector.commit();

        let mesh = sector.mesh();
        assert_eq!(mesh.normals().len(), 3);
        assert!(mesh.bounds().is_some());
    }

    #[test]
    fn commit_does_not_disturb_a_shared_handle() {
        let mut sector = MeshSector::new();
        sector.add_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        sector.commit();
        let held = Arc::clone(sector.mesh());

        sector.reset();
        sector.commit();

        assert_eq!(held.triangle_count(), 1);
        assert!(sector.mesh().is_empty());
    }
}
