use std::time::Instant;

use spatialmesh_common::Transform;
use spatialmesh_render::SurfaceProvider;

use crate::config::ImportConfig;
use crate::importer::{ImportContext, ImportStep, MeshImporter};
use crate::map::SectorMap;
use crate::scheduler::{ImportState, should_import};
use crate::source::GeometrySource;

/// What a host tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No run active and the scheduler kept the gate closed.
    Idle,
    /// A new run started and yielded after its first slice.
    Started,
    /// An active run advanced by one slice and yielded again.
    InProgress,
    /// A run ended during this tick.
    Finished,
}

/// Host-facing owner of the sector map and import pipeline.
///
/// The host calls [`SpatialMesh::tick`] once per frame. Each tick either advances the
/// active run by one budgeted slice, or asks the scheduler whether to start a new one.
#[derive(Debug)]
pub struct SpatialMesh {
    config: ImportConfig,
    sectors: SectorMap,
    importer: MeshImporter,
    parent: Transform,
}

impl SpatialMesh {
    pub fn new(config: ImportConfig) -> Self {
        Self::with_parent(config, Transform::default())
    }

    /// Surfaces are created under `parent`.
    pub fn with_parent(config: ImportConfig, parent: Transform) -> Self {
        Self::starting_at(config, parent, Instant::now())
    }

    /// As [`SpatialMesh::with_parent`], with the "last import" clock stamped at `now`.
    pub fn starting_at(config: ImportConfig, parent: Transform, now: Instant) -> Self {
        let importer = MeshImporter::with_state(config.max_frame_time(), ImportState::new(now));
        Self {
            config,
            sectors: SectorMap::new(),
            importer,
            parent,
        }
    }

    /// Advance the import pipeline for one host frame.
    pub fn tick(
        &mut self,
        now: Instant,
        source: &mut dyn GeometrySource,
        surfaces: &mut dyn SurfaceProvider,
    ) -> TickOutcome {
        if self.importer.is_active() {
            return match self.resume(now, source, surfaces) {
                ImportStep::Continue => TickOutcome::InProgress,
                ImportStep::Done => TickOutcome::Finished,
            };
        }

        if !should_import(now, self.importer.state(), &self.config, source.is_scanning()) {
            return TickOutcome::Idle;
        }
        if !self.importer.begin_import(source) {
            return TickOutcome::Idle;
        }
        match self.resume(now, source, surfaces) {
            ImportStep::Continue => TickOutcome::Started,
            ImportStep::Done => TickOutcome::Finished,
        }
    }

    /// Start a run regardless of the import period and drive it to completion.
    ///
    /// Still single-flight and still honours the source's import gate. The run end is
    /// stamped with the wall clock. Returns whether a run took place.
    pub fn import_now(
        &mut self,
        source: &mut dyn GeometrySource,
        surfaces: &mut dyn SurfaceProvider,
    ) -> bool {
        if !self.importer.begin_import(source) {
            return false;
        }
        while self.resume(Instant::now(), source, surfaces) == ImportStep::Continue {}
        true
    }

    /// Show or hide every committed surface.
    pub fn set_draw_processed_mesh(&mut self, visible: bool, surfaces: &mut dyn SurfaceProvider) {
        self.config.sector_visibility_enabled = visible;
        surfaces.set_visible(visible);
    }

    pub fn draw_processed_mesh(&self) -> bool {
        self.config.sector_visibility_enabled
    }

    /// Replace the configuration. Takes effect from the next slice.
    pub fn set_config(&mut self, config: ImportConfig) {
        self.importer.set_max_frame_time(config.max_frame_time());
        self.config = config;
    }

    /// Tear down host surfaces. Sectors are kept and re-paired on the next commit.
    pub fn cleanup(&mut self, surfaces: &mut dyn SurfaceProvider) {
        tracing::debug!(surfaces = surfaces.surface_count(), "clearing surfaces");
        surfaces.clear_surfaces();
    }

    pub fn sectors(&self) -> &SectorMap {
        &self.sectors
    }

    pub fn importer(&self) -> &MeshImporter {
        &self.importer
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn is_import_active(&self) -> bool {
        self.importer.is_active()
    }

    fn resume(
        &mut self,
        now: Instant,
        source: &mut dyn GeometrySource,
        surfaces: &mut dyn SurfaceProvider,
    ) -> ImportStep {
        let surfaces_before = surfaces.surface_count();
        let mut ctx = ImportContext {
            sectors: &mut self.sectors,
            source,
            surfaces: &mut *surfaces,
            parent: &self.parent,
            now,
        };
        let step = self.importer.resume(&mut ctx);
        if surfaces.surface_count() != surfaces_before {
            surfaces.set_visible(self.config.sector_visibility_enabled);
        }
        step
    }
}
