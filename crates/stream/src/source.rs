use std::collections::VecDeque;

use glam::Vec3;
use spatialmesh_common::RawMeshBuffer;

/// Errors reported by a geometry source. The importer treats all of them as
/// "nothing ready yet".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("no geometry pending")]
    NotReady,
    #[error("size query failed: {0}")]
    QueryFailed(String),
    #[error("extraction failed: {0}")]
    ExtractFailed(String),
}

/// Buffer sizes reported by a size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSize {
    pub vertex_count: usize,
    pub index_count: usize,
}

impl PendingSize {
    /// Whether both counts are positive.
    pub fn has_geometry(&self) -> bool {
        self.vertex_count > 0 && self.index_count > 0
    }
}

/// The scanning subsystem that produces mesh geometry.
///
/// Extraction is two-phase: the importer asks for sizes, allocates buffers, then
/// lends them to [`GeometrySource::extract_into`] for a single bulk fill. The
/// borrow ends when the call returns.
pub trait GeometrySource {
    /// Gate controlling whether imports may start at all.
    fn allow_import(&self) -> bool;

    /// Whether the scanner is currently scanning.
    fn is_scanning(&self) -> bool;

    /// Sizes of the geometry ready for extraction.
    fn query_pending_size(&mut self) -> Result<PendingSize, SourceError>;

    /// Fill the buffers with the pending geometry. Slice lengths match the last query.
    fn extract_into(
        &mut self,
        vertices: &mut [Vec3],
        normals: &mut [Vec3],
        indices: &mut [u32],
    ) -> Result<(), SourceError>;
}

/// In-memory geometry source fed with prepared buffers.
///
/// Each extraction consumes the front buffer of the queue; once the queue runs dry
/// the most recent buffer is served again, like a scanner that keeps reporting its
/// latest full mesh.
#[derive(Debug)]
pub struct ScriptedSource {
    queue: VecDeque<RawMeshBuffer>,
    latest: Option<RawMeshBuffer>,
    allow_import: bool,
    scanning: bool,
    fail_next_query: bool,
    fail_next_extract: bool,
    extractions: usize,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            latest: None,
            allow_import: true,
            scanning: true,
            fail_next_query: false,
            fail_next_extract: false,
            extractions: 0,
        }
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: RawMeshBuffer) -> Self {
        let mut source = Self::new();
        source.push(buffer);
        source
    }

    /// Queue a buffer for a future extraction.
    pub fn push(&mut self, buffer: RawMeshBuffer) {
        self.queue.push_back(buffer);
    }

    pub fn set_allow_import(&mut self, allow: bool) {
        self.allow_import = allow;
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    pub fn fail_next_query(&mut self) {
        self.fail_next_query = true;
    }

    pub fn fail_next_extract(&mut self) {
        self.fail_next_extract = true;
    }

    /// Number of successful extractions so far.
    pub fn extractions(&self) -> usize {
        self.extractions
    }

    fn current(&self) -> Option<&RawMeshBuffer> {
        self.queue.front().or(self.latest.as_ref())
    }
}

impl GeometrySource for ScriptedSource {
    fn allow_import(&self) -> bool {
        self.allow_import
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }

    fn query_pending_size(&mut self) -> Result<PendingSize, SourceError> {
        if std::mem::take(&mut self.fail_next_query) {
            return Err(SourceError::QueryFailed("scripted failure".into()));
        }
        let buffer = self.current().ok_or(SourceError::NotReady)?;
        Ok(PendingSize {
            vertex_count: buffer.vertices.len(),
            index_count: buffer.indices.len(),
        })
    }

    fn extract_into(
        &mut self,
        vertices: &mut [Vec3],
        normals: &mut [Vec3],
        indices: &mut [u32],
    ) -> Result<(), SourceError> {
        if std::mem::take(&mut self.fail_next_extract) {
            return Err(SourceError::ExtractFailed("scripted failure".into()));
        }
        if let Some(next) = self.queue.pop_front() {
            self.latest = Some(next);
        }
        let buffer = self.latest.as_ref().ok_or(SourceError::NotReady)?;
        if buffer.vertices.len() != vertices.len()
            || buffer.normals.len() != normals.len()
            || buffer.indices.len() != indices.len()
        {
            return Err(SourceError::ExtractFailed(
                "buffer sizes do not match the last size query".into(),
            ));
        }
        vertices.copy_from_slice(&buffer.vertices);
        normals.copy_from_slice(&buffer.normals);
        indices.copy_from_slice(&buffer.indices);
        self.extractions += 1;
        Ok(())
    }
}
