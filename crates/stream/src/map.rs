use glam::Vec3;
use indexmap::IndexMap;
use spatialmesh_common::SectorKey;

use crate::sector::{MeshSector, SectorError};

/// Result of bucketing one triangle into the sectors it touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketOutcome {
    /// Sectors the triangle was copied into.
    pub inserted: usize,
    /// Sectors that rejected the triangle because they were full.
    pub dropped: usize,
}

/// Insertion-ordered mapping from sector key to sector.
///
/// Sectors are created on first reference and never removed. Iteration order is
/// creation order, and a sector's position in that order (not its key) decides
/// which host render surface it is paired with.
#[derive(Debug, Default)]
pub struct SectorMap {
    sectors: IndexMap<SectorKey, MeshSector>,
}

impl SectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the sector for `key`, registering an empty one if it does not exist yet.
    pub fn get_or_create(&mut self, key: SectorKey) -> &mut MeshSector {
        self.sectors.entry(key).or_default()
    }

    pub fn get(&self, key: SectorKey) -> Option<&MeshSector> {
        self.sectors.get(&key)
    }

    /// Clear collected geometry in every sector, ahead of a new import pass.
    pub fn reset_all(&mut self) {
        for sector in self.sectors.values_mut() {
            sector.reset();
        }
    }

    /// Sectors in stable creation order.
    pub fn ordered_sectors(&self) -> impl Iterator<Item = (&SectorKey, &MeshSector)> {
        self.sectors.iter()
    }

    /// Sector at a creation-order position.
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&SectorKey, &mut MeshSector)> {
        self.sectors.get_index_mut(index)
    }

    /// Add a triangle to the sector identified by `key`.
    pub fn add_triangle_to_sector(
        &mut self,
        key: SectorKey,
        p1: Vec3,
        p2: Vec3,
        p3: Vec3,
    ) -> Result<(), SectorError> {
        self.get_or_create(key).add_triangle(p1, p2, p3)
    }

    /// Copy a triangle into every distinct sector its vertices fall in.
    ///
    /// The first vertex's sector always receives it; the second's only if it differs
    /// from the first; the third's only if it differs from both. Straddling triangles
    /// are therefore duplicated at sector edges so each sector renders without seams.
    pub fn bucket_triangle(&mut self, [p1, p2, p3]: [Vec3; 3]) -> BucketOutcome {
        let first = SectorKey::from_point(p1);
        let second = SectorKey::from_point(p2);
        let third = SectorKey::from_point(p3);

        let mut outcome = BucketOutcome::default();
        let mut add = |map: &mut Self, key: SectorKey| {
            match map.add_triangle_to_sector(key, p1, p2, p3) {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    tracing::error!(sector = %key, "{e}; triangle dropped");
                    outcome.dropped += 1;
                }
            }
        };

        add(self, first);
        if second != first {
            add(self, second);
        }
        if third != first && third != second {
            add(self, third);
        }
        outcome
    }

    /// Number of sectors ever created.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Number of sectors holding geometry from the current pass.
    pub fn non_empty_count(&self) -> usize {
        self.sectors.values().filter(|s| !s.is_empty()).count()
    }

    /// Total collected vertices across all sectors.
    pub fn total_vertices(&self) -> usize {
        self.sectors.values().map(|s| s.vertex_count()).sum()
    }

    /// Total collected triangles across all sectors, duplicates at edges included.
    pub fn total_triangles(&self) -> usize {
        self.sectors.values().map(|s| s.triangle_count()).sum()
    }
}
