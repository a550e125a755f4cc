use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use spatialmesh_common::{RawMeshBuffer, Transform};
use spatialmesh_render::SurfaceProvider;

use crate::budget::FrameBudget;
use crate::map::SectorMap;
use crate::scheduler::ImportState;
use crate::source::{GeometrySource, PendingSize};

/// Index-list stride between budget checks while bucketing (every 10 triangles).
const BUDGET_CHECK_STRIDE: usize = 30;

/// Name given to the host surface paired with the sector at `index`.
pub fn surface_name(index: usize) -> String {
    format!("SpatialMesh Sector-{index}")
}

/// Where an import run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    SizeQuery,
    BufferPull(PendingSize),
    /// Bucketing triangles; `cursor` is the next index-list offset.
    Bucketing { cursor: usize },
    /// Committing sectors; `cursor` is the next sector in creation order.
    Committing { cursor: usize },
    /// Releasing the staging buffer and stamping the run end.
    Finishing,
}

/// Result of one resumed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStep {
    /// The run yielded; resume it on a later tick.
    Continue,
    /// The run is over (or none was active).
    Done,
}

/// Collaborators a slice of import work needs.
pub struct ImportContext<'a> {
    pub sectors: &'a mut SectorMap,
    pub source: &'a mut dyn GeometrySource,
    pub surfaces: &'a mut dyn SurfaceProvider,
    pub parent: &'a Transform,
    /// Host clock for this slice. A run that ends here is stamped with it.
    pub now: Instant,
}

/// Counters for one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    /// Triangles read from the source buffer.
    pub triangles: usize,
    /// Triangle copies placed into sectors, edge duplicates included.
    pub sector_insertions: usize,
    /// Triangle copies rejected by full sectors.
    pub dropped_triangles: usize,
    pub sectors_committed: usize,
    pub surfaces_created: usize,
    pub slices: usize,
    /// Time spent across every slice of the run.
    pub slice_total: Duration,
    pub slice_average: Duration,
    pub slice_max: Duration,
}

impl ImportStats {
    fn record_slice(&mut self, elapsed: Duration) {
        self.slices += 1;
        self.slice_total += elapsed;
        self.slice_max = self.slice_max.max(elapsed);
    }
}

/// Resumable import pipeline.
///
/// A run moves `SizeQuery -> BufferPull -> Bucketing -> Committing -> Finishing -> Idle`.
/// The host calls [`MeshImporter::resume`] once per scheduling quantum; each call does
/// at most roughly one frame budget of work before yielding.
#[derive(Debug)]
pub struct MeshImporter {
    phase: ImportPhase,
    state: ImportState,
    budget: FrameBudget,
    staging: Option<RawMeshBuffer>,
    stats: ImportStats,
    last_stats: Option<ImportStats>,
}

impl MeshImporter {
    pub fn new(max_frame_time: Duration) -> Self {
        Self::with_state(max_frame_time, ImportState::default())
    }

    pub fn with_state(max_frame_time: Duration, state: ImportState) -> Self {
        Self {
            phase: ImportPhase::Idle,
            state,
            budget: FrameBudget::new(max_frame_time),
            staging: None,
            stats: ImportStats::default(),
            last_stats: None,
        }
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_import_active
    }

    /// Stats of the most recently finished run.
    pub fn last_stats(&self) -> Option<&ImportStats> {
        self.last_stats.as_ref()
    }

    pub fn set_max_frame_time(&mut self, max_frame_time: Duration) {
        self.budget.set_max_frame_time(max_frame_time);
    }

    /// Start a run. No-op returning `false` if one is already active or the source's
    /// import gate is closed.
    pub fn begin_import(&mut self, source: &dyn GeometrySource) -> bool {
        if self.state.is_import_active {
            tracing::debug!("import already active");
            return false;
        }
        if !source.allow_import() {
            tracing::debug!("source does not allow import");
            return false;
        }
        self.state.is_import_active = true;
        self.phase = ImportPhase::SizeQuery;
        self.stats = ImportStats::default();
        tracing::debug!("import started");
        true
    }

    /// Run one slice of the active import.
    pub fn resume(&mut self, ctx: &mut ImportContext<'_>) -> ImportStep {
        if self.phase == ImportPhase::Idle {
            return ImportStep::Done;
        }
        let _span = tracing::info_span!("mesh_import").entered();
        self.budget.restart();

        let step = self.run_slice(ctx);

        let elapsed = self.budget.elapsed();
        self.stats.record_slice(elapsed);
        tracing::trace!(phase = ?self.phase, ?elapsed, "import slice complete");

        if step == ImportStep::Done {
            self.stats.slice_average = self.stats.slice_total / self.stats.slices as u32;
            if self.stats.triangles > 0 {
                tracing::info!(
                    triangles = self.stats.triangles,
                    insertions = self.stats.sector_insertions,
                    dropped = self.stats.dropped_triangles,
                    sectors = self.stats.sectors_committed,
                    slices = self.stats.slices,
                    "import complete"
                );
            }
            self.last_stats = Some(std::mem::take(&mut self.stats));
        }
        step
    }

    fn run_slice(&mut self, ctx: &mut ImportContext<'_>) -> ImportStep {
        loop {
            match self.phase {
                ImportPhase::Idle => return ImportStep::Done,
                ImportPhase::SizeQuery => match ctx.source.query_pending_size() {
                    Ok(size) if size.has_geometry() => {
                        self.phase = ImportPhase::BufferPull(size);
                    }
                    Ok(size) => {
                        tracing::debug!(?size, "nothing pending");
                        self.phase = ImportPhase::Finishing;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "size query not ready");
                        self.phase = ImportPhase::Finishing;
                    }
                },
                ImportPhase::BufferPull(size) => {
                    let mut staging = RawMeshBuffer::with_sizes(size.vertex_count, size.index_count);
                    let extracted = ctx.source.extract_into(
                        &mut staging.vertices,
                        &mut staging.normals,
                        &mut staging.indices,
                    );
                    if let Err(e) = extracted {
                        tracing::debug!(error = %e, "extraction not ready");
                        self.phase = ImportPhase::Finishing;
                        continue;
                    }
                    if let Err(e) = staging.validate() {
                        tracing::warn!(error = %e, "discarding malformed mesh buffer");
                        self.phase = ImportPhase::Finishing;
                        continue;
                    }
                    tracing::debug!(
                        vertices = size.vertex_count,
                        indices = size.index_count,
                        "mesh extracted"
                    );
                    self.staging = Some(staging);
                    ctx.sectors.reset_all();
                    self.phase = ImportPhase::Bucketing { cursor: 0 };
                    return ImportStep::Continue;
                }
                ImportPhase::Bucketing { cursor } => {
                    let Some(staging) = self.staging.as_ref() else {
                        self.phase = ImportPhase::Finishing;
                        continue;
                    };
                    let len = staging.indices.len();
                    let mut index = cursor;
                    while index < len {
                        let outcome = ctx.sectors.bucket_triangle(staging.triangle_at(index));
                        self.stats.triangles += 1;
                        self.stats.sector_insertions += outcome.inserted;
                        self.stats.dropped_triangles += outcome.dropped;

                        let checkpoint = index % BUDGET_CHECK_STRIDE == 0;
                        index += 3;
                        if checkpoint && index < len && self.budget.exceeded() {
                            self.phase = ImportPhase::Bucketing { cursor: index };
                            return ImportStep::Continue;
                        }
                    }
                    tracing::debug!(sectors = ctx.sectors.len(), "bucketing complete");
                    self.budget.restart();
                    self.phase = ImportPhase::Committing { cursor: 0 };
                }
                ImportPhase::Committing { cursor } => {
                    let count = ctx.sectors.len();
                    let mut i = cursor;
                    while i < count {
                        while ctx.surfaces.surface_count() <= i {
                            let name = surface_name(ctx.surfaces.surface_count());
                            ctx.surfaces.create_surface(&name, ctx.parent);
                            self.stats.surfaces_created += 1;
                        }
                        if let Some((_, sector)) = ctx.sectors.get_index_mut(i) {
                            sector.commit();
                            ctx.surfaces.assign_mesh(i, Arc::clone(sector.mesh()));
                        }
                        self.stats.sectors_committed += 1;
                        i += 1;
                        if i < count && self.budget.exceeded() {
                            self.phase = ImportPhase::Committing { cursor: i };
                            return ImportStep::Continue;
                        }
                    }
                    if ctx.surfaces.surface_count() > count {
                        tracing::warn!(
                            surfaces = ctx.surfaces.surface_count(),
                            sectors = count,
                            "more surfaces than mesh sectors"
                        );
                    }
                    self.phase = ImportPhase::Finishing;
                    return ImportStep::Continue;
                }
                ImportPhase::Finishing => {
                    self.finish(ctx.now);
                    return ImportStep::Done;
                }
            }
        }
    }

    fn finish(&mut self, now: Instant) {
        self.staging = None;
        self.state.is_import_active = false;
        self.state.last_import = now;
        self.phase = ImportPhase::Idle;
        tracing::debug!("import finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use spatialmesh_common::SectorKey;
    use spatialmesh_render::DebugSurfaces;

    use crate::source::ScriptedSource;

    struct Harness {
        importer: MeshImporter,
        sectors: SectorMap,
        source: ScriptedSource,
        surfaces: DebugSurfaces,
        parent: Transform,
        now: Instant,
    }

    impl Harness {
        fn new(source: ScriptedSource, budget: Duration) -> Self {
            Self {
                importer: MeshImporter::new(budget),
                sectors: SectorMap::new(),
                source,
                surfaces: DebugSurfaces::new(),
                parent: Transform::default(),
                now: Instant::now(),
            }
        }

        fn resume(&mut self) -> ImportStep {
            let mut ctx = ImportContext {
                sectors: &mut self.sectors,
                source: &mut self.source,
                surfaces: &mut self.surfaces,
                parent: &self.parent,
                now: self.now,
            };
            self.importer.resume(&mut ctx)
        }

        /// Begin a run and drive it to completion, returning the number of slices.
        fn run(&mut self) -> usize {
            assert!(self.importer.begin_import(&self.source));
            let mut slices = 0;
            loop {
                slices += 1;
                if self.resume() == ImportStep::Done {
                    return slices;
                }
                assert!(slices < 1_000_000, "import never finished");
            }
        }
    }

    fn straddling_triangle() -> RawMeshBuffer {
        RawMeshBuffer::from_triangles(
            vec![
                Vec3::new(0.2, 0.1, 0.3),
                Vec3::new(1.5, 0.2, 0.4),
                Vec3::new(0.1, 0.6, 0.2),
            ],
            vec![0, 1, 2],
        )
    }

    /// A strip of `n` small triangles marching along +X, one per 0.25 m.
    fn strip(n: usize) -> RawMeshBuffer {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..n {
            let x = i as f32 * 0.25;
            let base = vertices.len() as u32;
            vertices.extend([
                Vec3::new(x, 0.1, 0.1),
                Vec3::new(x + 0.1, 0.1, 0.1),
                Vec3::new(x, 0.2, 0.1),
            ]);
            indices.extend([base, base + 1, base + 2]);
        }
        RawMeshBuffer::from_triangles(vertices, indices)
    }

    #[test]
    fn full_run_buckets_commits_and_assigns() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        h.run();

        assert_eq!(h.sectors.len(), 2);
        assert!(h.sectors.get(SectorKey::new(0, 0, 0)).is_some());
        assert!(h.sectors.get(SectorKey::new(1, 0, 0)).is_some());
        assert_eq!(h.surfaces.surface_count(), 2);
        assert_eq!(h.surfaces.triangle_count(), 2);
        assert_eq!(h.surfaces.get(0).unwrap().name, "SpatialMesh Sector-0");

        let stats = h.importer.last_stats().unwrap();
        assert_eq!(stats.triangles, 1);
        assert_eq!(stats.sector_insertions, 2);
        assert_eq!(stats.sectors_committed, 2);
        assert_eq!(stats.surfaces_created, 2);
    }

    #[test]
    fn run_yields_after_extraction_and_before_finishing() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        assert!(h.importer.begin_import(&h.source));

        assert_eq!(h.resume(), ImportStep::Continue);
        assert_eq!(h.importer.phase(), ImportPhase::Bucketing { cursor: 0 });
        assert!(h.importer.is_active());

        assert_eq!(h.resume(), ImportStep::Continue);
        assert_eq!(h.importer.phase(), ImportPhase::Finishing);
        assert!(h.importer.is_active());

        assert_eq!(h.resume(), ImportStep::Done);
        assert_eq!(h.importer.phase(), ImportPhase::Idle);
        assert!(!h.importer.is_active());
        assert_eq!(h.importer.last_stats().unwrap().slices, 3);
    }

    #[test]
    fn zero_budget_spreads_work_over_many_slices() {
        let source = ScriptedSource::with_buffer(strip(200));
        let mut generous = Harness::new(source, Duration::from_secs(60));
        let generous_slices = generous.run();

        let source = ScriptedSource::with_buffer(strip(200));
        let mut tight = Harness::new(source, Duration::ZERO);
        let tight_slices = tight.run();

        assert_eq!(generous_slices, 3);
        assert!(tight_slices > generous_slices);
        // Same geometry either way.
        assert_eq!(tight.sectors.len(), generous.sectors.len());
        assert_eq!(tight.sectors.total_triangles(), generous.sectors.total_triangles());
        assert_eq!(tight.surfaces.triangle_count(), generous.surfaces.triangle_count());
    }

    #[test]
    fn bucketing_yields_every_ten_triangles_under_zero_budget() {
        let buffer = strip(200);
        let index_count = buffer.indices.len();
        let mut h = Harness::new(ScriptedSource::with_buffer(buffer), Duration::ZERO);
        assert!(h.importer.begin_import(&h.source));
        assert_eq!(h.resume(), ImportStep::Continue);
        assert_eq!(h.importer.phase(), ImportPhase::Bucketing { cursor: 0 });

        let mut cursors = Vec::new();
        loop {
            assert_eq!(h.resume(), ImportStep::Continue);
            match h.importer.phase() {
                ImportPhase::Bucketing { cursor } => cursors.push(cursor),
                _ => break,
            }
        }

        // Each slice stops right after the triangle at a multiple of 30.
        let expected: Vec<usize> = (0..index_count).step_by(30).map(|i| i + 3).collect();
        assert_eq!(cursors, expected);
        assert!(index_count - cursors.last().unwrap() < 30);
    }

    #[test]
    fn committing_yields_after_each_sector_under_zero_budget() {
        let mut h = Harness::new(ScriptedSource::with_buffer(strip(200)), Duration::ZERO);
        assert!(h.importer.begin_import(&h.source));

        let mut cursors = Vec::new();
        while h.resume() == ImportStep::Continue {
            if let ImportPhase::Committing { cursor } = h.importer.phase() {
                cursors.push(cursor);
            }
        }

        // One triangle per 0.25 m along +X: four per cell, 50 cells.
        let sectors = h.sectors.len();
        assert_eq!(sectors, 50);
        assert_eq!(cursors, (1..sectors).collect::<Vec<_>>());
        assert_eq!(h.surfaces.surface_count(), sectors);
    }

    #[test]
    fn run_end_is_stamped_with_the_host_clock() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        h.now = Instant::now() + Duration::from_secs(10);
        h.run();
        assert_eq!(h.importer.state().last_import, h.now);
    }

    #[test]
    fn slice_stats_cover_the_whole_run() {
        let mut h = Harness::new(ScriptedSource::with_buffer(strip(200)), Duration::ZERO);
        let slices = h.run();

        let stats = h.importer.last_stats().unwrap();
        assert_eq!(stats.slices, slices);
        assert!(stats.slices > 64);
        assert!(stats.slice_max <= stats.slice_total);
        assert!(stats.slice_average <= stats.slice_max);
        assert_eq!(stats.slice_average, stats.slice_total / slices as u32);
    }

    #[test]
    fn not_ready_source_finishes_in_one_slice() {
        let mut h = Harness::new(ScriptedSource::new(), Duration::from_secs(60));
        assert_eq!(h.run(), 1);
        assert!(!h.importer.is_active());
        assert_eq!(h.importer.state().last_import, h.now);
        assert!(h.sectors.is_empty());
        assert_eq!(h.surfaces.surface_count(), 0);
    }

    #[test]
    fn failed_extraction_keeps_previous_geometry() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        h.run();

        h.source.fail_next_extract();
        assert_eq!(h.run(), 1);
        assert_eq!(h.sectors.total_triangles(), 2);
        assert_eq!(h.surfaces.triangle_count(), 2);
    }

    #[test]
    fn malformed_buffer_is_discarded() {
        let mut bad = straddling_triangle();
        bad.indices[2] = 7;
        let mut h = Harness::new(ScriptedSource::with_buffer(bad), Duration::from_secs(60));
        assert_eq!(h.run(), 1);
        assert!(h.sectors.is_empty());
        assert!(!h.importer.is_active());
    }

    #[test]
    fn begin_is_single_flight() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        assert!(h.importer.begin_import(&h.source));
        assert!(!h.importer.begin_import(&h.source));
    }

    #[test]
    fn closed_gate_prevents_run() {
        let mut source = ScriptedSource::with_buffer(straddling_triangle());
        source.set_allow_import(false);
        let mut h = Harness::new(source, Duration::from_secs(60));

        assert!(!h.importer.begin_import(&h.source));
        assert!(!h.importer.is_active());
        assert_eq!(h.resume(), ImportStep::Done);
        assert!(h.sectors.is_empty());
    }

    #[test]
    fn emptied_sector_commits_to_empty_mesh_on_next_pass() {
        let mut source = ScriptedSource::with_buffer(straddling_triangle());
        // Second pass: a single triangle wholly inside (0,0,0).
        source.push(RawMeshBuffer::from_triangles(
            vec![
                Vec3::new(0.1, 0.1, 0.1),
                Vec3::new(0.2, 0.1, 0.1),
                Vec3::new(0.1, 0.2, 0.1),
            ],
            vec![0, 1, 2],
        ));
        let mut h = Harness::new(source, Duration::from_secs(60));
        h.run();
        h.run();

        // Sectors and surfaces persist; the (1,0,0) sector is now empty.
        assert_eq!(h.sectors.len(), 2);
        assert_eq!(h.surfaces.surface_count(), 2);
        assert!(h.sectors.get(SectorKey::new(1, 0, 0)).unwrap().mesh().is_empty());
        assert!(h.surfaces.get(1).unwrap().mesh.as_ref().unwrap().is_empty());
        assert_eq!(h.importer.last_stats().unwrap().surfaces_created, 0);
    }

    #[test]
    fn extra_surfaces_are_left_alone() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        for i in 0..5 {
            h.surfaces.create_surface(&surface_name(i), &Transform::default());
        }
        h.run();

        assert_eq!(h.surfaces.surface_count(), 5);
        assert_eq!(h.importer.last_stats().unwrap().surfaces_created, 0);
        assert!(h.surfaces.get(4).unwrap().mesh.is_none());
    }

    #[test]
    fn staging_buffer_released_at_run_end() {
        let source = ScriptedSource::with_buffer(straddling_triangle());
        let mut h = Harness::new(source, Duration::from_secs(60));
        h.run();
        assert!(h.importer.staging.is_none());
    }
}
