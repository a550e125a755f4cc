use glam::Vec3;

/// Errors from validating a raw mesh buffer handed over by a geometry source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangles(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch { vertices: usize, normals: usize },
}

/// Flat triangle-list geometry as extracted from a scanning subsystem.
///
/// Positions and normals are parallel arrays; every three indices form one triangle.
/// The buffer is transient: it lives for one import pass and is dropped once bucketed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeshBuffer {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl RawMeshBuffer {
    /// Allocate a zeroed buffer of the given sizes, ready to be filled by a bulk transfer.
    pub fn with_sizes(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: vec![Vec3::ZERO; vertex_count],
            normals: vec![Vec3::ZERO; vertex_count],
            indices: vec![0; index_count],
        }
    }

    /// Build a buffer from positions and indices, with zero normals.
    pub fn from_triangles(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let normals = vec![Vec3::ZERO; vertices.len()];
        Self {
            vertices,
            normals,
            indices,
        }
    }

    /// Check the triangle-list contract: whole triangles, in-range indices, parallel normals.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.indices.len() % 3 != 0 {
            return Err(BufferError::IndexCountNotTriangles(self.indices.len()));
        }
        if self.normals.len() != self.vertices.len() {
            return Err(BufferError::NormalCountMismatch {
                vertices: self.vertices.len(),
                normals: self.normals.len(),
            });
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(BufferError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Number of whole triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Resolve the three positions of the triangle starting at index-list offset `start`.
    ///
    /// The buffer must have been validated.
    pub fn triangle_at(&self, start: usize) -> [Vec3; 3] {
        [
            self.vertices[self.indices[start] as usize],
            self.vertices[self.indices[start + 1] as usize],
            self.vertices[self.indices[start + 2] as usize],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> RawMeshBuffer {
        RawMeshBuffer::from_triangles(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn valid_buffer_passes() {
        let buf = unit_triangle();
        assert!(buf.validate().is_ok());
        assert_eq!(buf.triangle_count(), 1);
        assert_eq!(buf.triangle_at(0), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn partial_triangle_rejected() {
        let mut buf = unit_triangle();
        buf.indices.push(0);
        assert_eq!(buf.validate(), Err(BufferError::IndexCountNotTriangles(4)));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut buf = unit_triangle();
        buf.indices[2] = 3;
        assert_eq!(
            buf.validate(),
            Err(BufferError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn normal_mismatch_rejected() {
        let mut buf = unit_triangle();
        buf.normals.pop();
        assert!(matches!(
            buf.validate(),
            Err(BufferError::NormalCountMismatch { .. })
        ));
    }

    #[test]
    fn with_sizes_allocates_zeroed() {
        let buf = RawMeshBuffer::with_sizes(4, 6);
        assert_eq!(buf.vertices.len(), 4);
        assert_eq!(buf.normals.len(), 4);
        assert_eq!(buf.indices, vec![0; 6]);
        assert!(!buf.is_empty());
        assert!(RawMeshBuffer::default().is_empty());
    }
}
