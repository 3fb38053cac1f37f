use crate::data_structures::model::ModelVertex;

/// Triangle mesh on the CPU, ready for [`crate::data_structures::model::GpuMesh::upload`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Axis-aligned box centred on the origin with flat-shaded faces.
///
/// Each face gets its own four vertices so normals and UVs stay per-face.
pub fn cuboid(name: &str, width: f32, height: f32, depth: f32) -> MeshData {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    // normal, then the face's right and up axes (scaled to half extents)
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [hx, 0.0, 0.0], [0.0, hy, 0.0]),
        ([0.0, 0.0, -1.0], [-hx, 0.0, 0.0], [0.0, hy, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -hz], [0.0, hy, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, hz], [0.0, hy, 0.0]),
        ([0.0, 1.0, 0.0], [hx, 0.0, 0.0], [0.0, 0.0, -hz]),
        ([0.0, -1.0, 0.0], [hx, 0.0, 0.0], [0.0, 0.0, hz]),
    ];
    let half = [hx, hy, hz];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let base = vertices.len() as u32;
        let centre: [f32; 3] = std::array::from_fn(|i| normal[i] * half[i]);
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            vertices.push(ModelVertex {
                position: std::array::from_fn(|i| centre[i] + right[i] * u + up[i] * v),
                tex_coords: [(u + 1.0) / 2.0, (1.0 - v) / 2.0],
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData {
        name: name.to_string(),
        vertices,
        indices,
    }
}

/// Smooth vertex normals from the triangles that share each vertex.
///
/// Face normals are accumulated per vertex and normalized at the end.
/// Vertices that belong to no (or only degenerate) triangles keep +Z.
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    use cgmath::InnerSpace;

    let mut accumulated = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let pos0: cgmath::Vector3<_> = vertices[i0].position.into();
        let pos1: cgmath::Vector3<_> = vertices[i1].position.into();
        let pos2: cgmath::Vector3<_> = vertices[i2].position.into();

        // area-weighted: the cross product is not normalized
        let face = (pos1 - pos0).cross(pos2 - pos0);
        accumulated[i0] += face;
        accumulated[i1] += face;
        accumulated[i2] += face;
    }

    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if normal.magnitude2() > f32::EPSILON {
            normal.normalize().into()
        } else {
            [0.0, 0.0, 1.0]
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_six_quads() {
        let mesh = cuboid("box", 2.0, 3.0, 0.5);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let max_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        let max_z = mesh
            .vertices
            .iter()
            .map(|v| v.position[2])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_y, 1.5);
        assert_eq!(max_z, 0.25);
    }

    #[test]
    fn normals_of_a_flat_triangle_point_up_z() {
        let mut vertices = vec![
            ModelVertex {
                position: [0.0, 0.0, 0.0],
                ..Default::default()
            },
            ModelVertex {
                position: [1.0, 0.0, 0.0],
                ..Default::default()
            },
            ModelVertex {
                position: [0.0, 1.0, 0.0],
                ..Default::default()
            },
        ];
        compute_normals(&mut vertices, &[0, 1, 2]);
        for v in vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }
}
