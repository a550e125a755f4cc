use serde::Serialize;
use spatialmesh_common::SectorKey;
use spatialmesh_stream::SectorMap;

/// Sector map inspector for developer tooling.
///
/// Provides read-only queries against the sector map for debugging, profiling,
/// and CLI output.
pub struct SectorInspector;

impl SectorInspector {
    /// Produce a summary of the sector map.
    pub fn summary(sectors: &SectorMap) -> SectorMapSummary {
        let largest = sectors
            .ordered_sectors()
            .max_by_key(|(_, s)| s.vertex_count())
            .filter(|(_, s)| !s.is_empty())
            .map(|(k, s)| (*k, s.triangle_count()));
        SectorMapSummary {
            sector_count: sectors.len(),
            non_empty_sectors: sectors.non_empty_count(),
            total_vertices: sectors.total_vertices(),
            total_triangles: sectors.total_triangles(),
            largest_sector: largest.map(|(k, _)| k),
            largest_sector_triangles: largest.map_or(0, |(_, t)| t),
        }
    }

    /// Per-sector details in creation order (surface pairing order).
    pub fn list_sectors(sectors: &SectorMap) -> Vec<SectorInfo> {
        sectors
            .ordered_sectors()
            .enumerate()
            .map(|(slot, (key, sector))| {
                let mesh = sector.mesh();
                SectorInfo {
                    slot,
                    key: *key,
                    vertices: sector.vertex_count(),
                    triangles: sector.triangle_count(),
                    committed_triangles: mesh.triangle_count(),
                    bounds: mesh.bounds().map(|b| (b.min.to_array(), b.max.to_array())),
                }
            })
            .collect()
    }

    /// Details of one sector, if it exists.
    pub fn inspect_sector(sectors: &SectorMap, key: SectorKey) -> Option<SectorInfo> {
        Self::list_sectors(sectors)
            .into_iter()
            .find(|info| info.key == key)
    }
}

/// Summary of the sector map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorMapSummary {
    pub sector_count: usize,
    pub non_empty_sectors: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
    pub largest_sector: Option<SectorKey>,
    pub largest_sector_triangles: usize,
}

impl std::fmt::Display for SectorMapSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sectors: count={} non_empty={} vertices={} triangles={}",
            self.sector_count, self.non_empty_sectors, self.total_vertices, self.total_triangles
        )?;
        if let Some(key) = self.largest_sector {
            write!(
                f,
                " largest={key} ({} tris)",
                self.largest_sector_triangles
            )?;
        }
        Ok(())
    }
}

/// Detailed info about a single sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorInfo {
    /// Position in creation order, i.e. the paired surface index.
    pub slot: usize,
    pub key: SectorKey,
    /// Vertices collected in the current pass.
    pub vertices: usize,
    pub triangles: usize,
    /// Triangles in the last committed mesh.
    pub committed_triangles: usize,
    pub bounds: Option<([f32; 3], [f32; 3])>,
}

impl std::fmt::Display for SectorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sector #{} {} tris={} committed={}",
            self.slot, self.key, self.triangles, self.committed_triangles
        )?;
        if let Some((min, max)) = self.bounds {
            write!(
                f,
                " bounds=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
                min[0], min[1], min[2], max[0], max[1], max[2]
            )?;
        }
        Ok(())
    }
}
