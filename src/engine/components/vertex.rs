use std::mem::{offset_of, size_of};

use serde::{Deserialize, Serialize};

use crate::engine::rendering::GraphicsContext;

/// One vertex as it sits in the vertex buffer.
///
/// The field order is the GPU layout: position at byte 0, normal at 12,
/// texture coordinates at 24, 32 bytes per vertex.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// A float attribute read from the vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: usize,
}

impl Vertex {
    pub const STRIDE: usize = size_of::<Vertex>();

    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            components: 3,
            offset: offset_of!(Vertex, position),
        },
        VertexAttribute {
            location: 1,
            components: 3,
            offset: offset_of!(Vertex, normal),
        },
        VertexAttribute {
            location: 2,
            components: 2,
            offset: offset_of!(Vertex, tex_coords),
        },
    ];

    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    /// Points every attribute at the currently bound array buffer and records
    /// the layout in the currently bound vertex array.
    pub fn describe_layout<G: GraphicsContext>(gl: &G) {
        for attribute in Self::ATTRIBUTES {
            gl.enable_vertex_attrib_array(attribute.location);
            gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components,
                glow::FLOAT,
                false,
                Self::STRIDE as i32,
                attribute.offset as i32,
            );
        }
    }
}
