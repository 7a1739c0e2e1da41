use serde::{Deserialize, Serialize};

use crate::engine::components::mesh::Mesh;
use crate::engine::components::vertex::Vertex;

pub type Vec3 = [f32; 3];

/// Built-in geometry that can be turned into a mesh without any asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Unit right triangle in the XY plane, facing +Z.
    Triangle,
    /// Rectangle in the XY plane centred on the origin, facing +Z.
    Quad { half_extents: [f32; 2] },
    /// Axis-aligned cube centred on the origin with one quad per face.
    Cube { half_extent: f32 },
}

impl Shape {
    /// Counterclockwise triangles with outward normals.
    pub fn geometry(&self) -> (Vec<Vertex>, Vec<u32>) {
        let mut vertices = Mesh::generate_vertices();
        let mut indices = Mesh::generate_indices();

        match *self {
            Shape::Triangle => {
                let normal = [0.0, 0.0, 1.0];
                vertices.push(Vertex::new([0.0, 0.0, 0.0], normal, [0.0, 0.0]));
                vertices.push(Vertex::new([1.0, 0.0, 0.0], normal, [1.0, 0.0]));
                vertices.push(Vertex::new([0.0, 1.0, 0.0], normal, [0.0, 1.0]));
                indices.extend_from_slice(&[0, 1, 2]);
            }
            Shape::Quad { half_extents: [hx, hy] } => {
                push_face(
                    &mut vertices,
                    &mut indices,
                    [0.0, 0.0, 0.0],
                    [hx, 0.0, 0.0],
                    [0.0, hy, 0.0],
                    [0.0, 0.0, 1.0],
                );
            }
            Shape::Cube { half_extent: h } => {
                // (normal, u, v) with u x v == normal
                let faces: [(Vec3, Vec3, Vec3); 6] = [
                    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
                    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
                    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
                    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                ];
                for (normal, u, v) in faces {
                    push_face(
                        &mut vertices,
                        &mut indices,
                        scale(normal, h),
                        scale(u, h),
                        scale(v, h),
                        normal,
                    );
                }
            }
        }

        (vertices, indices)
    }
}

fn scale(v: Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

fn push_face(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    center: Vec3,
    u: Vec3,
    v: Vec3,
    normal: Vec3,
) {
    let base = vertices.len() as u32;
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (su, sv) in corners {
        let position = [
            center[0] + su * u[0] + sv * v[0],
            center[1] + su * u[1] + sv * v[1],
            center[2] + su * u[2] + sv * v[2],
        ];
        let tex_coords = [(su + 1.0) * 0.5, (sv + 1.0) * 0.5];
        vertices.push(Vertex::new(position, normal, tex_coords));
    }
    indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}
