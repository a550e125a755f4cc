use glam::Vec3;
use spatialmesh_common::RawMeshBuffer;

/// A UV sphere standing in for a scanned room: outward normals, triangle-list topology.
///
/// `segments` is the number of longitudinal slices; latitude uses half as many rings.
pub fn synthetic_sphere(center: Vec3, radius: f32, segments: u32) -> RawMeshBuffer {
    let segments = segments.max(3);
    let rings = (segments / 2).max(2);

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut normals = Vec::with_capacity(vertices.capacity());
    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(center + n * radius);
            normals.push(n);
        }
    }

    let row = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * row + seg;
            let b = a + row;
            if ring != 0 {
                indices.extend([a, a + 1, b]);
            }
            if ring != rings - 1 {
                indices.extend([a + 1, b + 1, b]);
            }
        }
    }

    RawMeshBuffer {
        vertices,
        normals,
        indices,
    }
}
