use glam::Vec3;

/// Triangle-list geometry: positions plus indices, three per triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        debug_assert_eq!(indices.len() % 3, 0, "indices must form whole triangles");
        Self { positions, indices }
    }

    /// Quad in the xy-plane spanning [-1, 1], facing +z.
    pub fn unit_quad() -> Self {
        let positions = vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Self { positions, indices }
    }

    /// Axis-aligned cube spanning [-0.5, 0.5] on every axis.
    pub fn unit_cube() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ];
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +z
            1, 0, 3, 1, 3, 2, // -z
            5, 1, 2, 5, 2, 6, // +x
            0, 4, 7, 0, 7, 3, // -x
            7, 6, 2, 7, 2, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
        ];
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Mesh;

    #[test]
    fn triangles_walks_the_index_buffer_in_threes() {
        let quad = Mesh::unit_quad();
        let tris: Vec<_> = quad.triangles().collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris.len(), quad.triangle_count());
        assert_eq!(tris[0][0], quad.positions[0]);
        assert_eq!(tris[1][2], quad.positions[3]);
    }

    #[test]
    fn unit_cube_covers_twelve_triangles() {
        let cube = Mesh::unit_cube();
        assert_eq!(cube.triangle_count(), 12);
        for tri in cube.triangles() {
            for v in tri {
                assert!(v.abs().max_element() <= 0.5);
            }
        }
    }
}
