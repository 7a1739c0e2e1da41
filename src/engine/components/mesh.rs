use std::fmt;
use std::rc::Rc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::engine::components::shapes::Shape;
use crate::engine::components::vertex::Vertex;
use crate::engine::error::MeshError;
use crate::engine::rendering::{BufferUsage, GpuResources, GraphicsContext};

/// Whether a mesh keeps its CPU-side geometry after uploading it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Drop vertices and indices once the GPU has them.
    #[default]
    Discard,
    /// Keep them alive for the lifetime of the mesh.
    Retain,
}

impl From<bool> for Retention {
    fn from(save: bool) -> Self {
        if save {
            Retention::Retain
        } else {
            Retention::Discard
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    pub retention: Retention,
    pub usage: BufferUsage,
}

/// CPU-side geometry owned by a mesh.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshData {
    Retained {
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    },
    /// The GPU holds the only copy.
    Uploaded,
}

/// Indexed triangle geometry living in a vertex array, a vertex buffer and an
/// element buffer.
///
/// The GPU objects are released when the mesh is dropped. A mesh holds an
/// `Rc` to its context, so it stays on the thread that created it.
pub struct Mesh<G: GraphicsContext = glow::Context> {
    resources: GpuResources<G>,
    data: MeshData,
    index_count: u32,
    vertex_count: usize,
    usage: BufferUsage,
}

impl Mesh {
    /// An empty vertex list to fill before calling [`Mesh::new`].
    pub fn generate_vertices() -> Vec<Vertex> {
        Vec::new()
    }

    /// An empty index list to fill before calling [`Mesh::new`].
    pub fn generate_indices() -> Vec<u32> {
        Vec::new()
    }
}

impl<G: GraphicsContext> Mesh<G> {
    pub fn new(
        gl: &Rc<G>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        retention: impl Into<Retention>,
    ) -> Result<Self, MeshError> {
        let options = MeshOptions {
            retention: retention.into(),
            ..MeshOptions::default()
        };
        Self::with_options(gl, vertices, indices, &options)
    }

    /// Uploads `vertices` and `indices` and describes the [`Vertex`] layout.
    ///
    /// Every index must be smaller than `vertices.len()`. Debug builds assert
    /// this; release builds leave out-of-range reads to the driver.
    pub fn with_options(
        gl: &Rc<G>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        options: &MeshOptions,
    ) -> Result<Self, MeshError> {
        if i32::try_from(indices.len()).is_err() {
            return Err(MeshError::TooManyIndices(indices.len()));
        }
        debug_assert!(
            indices.iter().all(|&i| (i as usize) < vertices.len()),
            "mesh index out of range for {} vertices",
            vertices.len()
        );

        let resources = GpuResources::allocate(gl)?;
        let usage = options.usage.gl_enum();

        gl.bind_vertex_array(Some(resources.vao()));

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(resources.vbo()));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(&vertices), usage);

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(resources.ebo()));
        gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(&indices), usage);

        Vertex::describe_layout(&**gl);

        gl.bind_vertex_array(None);

        let index_count = indices.len() as u32;
        let vertex_count = vertices.len();
        let data = match options.retention {
            Retention::Retain => MeshData::Retained { vertices, indices },
            Retention::Discard => MeshData::Uploaded,
        };

        debug!(
            "Created mesh {:?}: {} vertices, {} indices, {:?}",
            resources.vao(),
            vertex_count,
            index_count,
            options.retention
        );

        Ok(Self {
            resources,
            data,
            index_count,
            vertex_count,
            usage: options.usage,
        })
    }

    pub fn from_shape(gl: &Rc<G>, shape: &Shape, options: &MeshOptions) -> Result<Self, MeshError> {
        let (vertices, indices) = shape.geometry();
        Self::with_options(gl, vertices, indices, options)
    }

    /// Binds this mesh's vertex array and draws all of its indices as triangles.
    ///
    /// The vertex array stays bound afterwards.
    pub fn draw(&self) {
        let gl = self.resources.context();
        trace!("Drawing mesh {:?} ({} indices)", self.vao(), self.index_count);
        gl.bind_vertex_array(Some(self.resources.vao()));
        gl.draw_elements(glow::TRIANGLES, self.index_count as i32, glow::UNSIGNED_INT, 0);
    }

    pub fn vao(&self) -> G::VertexArray {
        self.resources.vao()
    }

    pub fn vbo(&self) -> G::Buffer {
        self.resources.vbo()
    }

    pub fn ebo(&self) -> G::Buffer {
        self.resources.ebo()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn is_retained(&self) -> bool {
        matches!(self.data, MeshData::Retained { .. })
    }

    pub fn vertices(&self) -> Option<&[Vertex]> {
        match &self.data {
            MeshData::Retained { vertices, .. } => Some(vertices),
            MeshData::Uploaded => None,
        }
    }

    pub fn indices(&self) -> Option<&[u32]> {
        match &self.data {
            MeshData::Retained { indices, .. } => Some(indices),
            MeshData::Uploaded => None,
        }
    }
}

impl<G: GraphicsContext> Drop for Mesh<G> {
    fn drop(&mut self) {
        debug!("Releasing mesh {:?}", self.resources.vao());
    }
}

impl<G: GraphicsContext> fmt::Debug for Mesh<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("resources", &self.resources)
            .field("index_count", &self.index_count)
            .field("vertex_count", &self.vertex_count)
            .field("retained", &self.is_retained())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rendering::{Command, HeadlessContext};

    fn triangle() -> (Vec<Vertex>, Vec<u32>) {
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], normal, [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], normal, [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], normal, [0.0, 1.0]),
        ];
        (vertices, vec![0, 1, 2])
    }

    #[test]
    fn save_flag_selects_retention() {
        assert_eq!(Retention::from(true), Retention::Retain);
        assert_eq!(Retention::from(false), Retention::Discard);
        assert_eq!(MeshOptions::default().retention, Retention::Discard);
    }

    #[test]
    fn construction_follows_upload_order() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&gl, vertices, indices, false).unwrap();
        let (vao, vbo, ebo) = (mesh.vao(), mesh.vbo(), mesh.ebo());

        let commands = gl.commands();
        assert_eq!(
            &commands[..9],
            &[
                Command::CreateVertexArray(vao),
                Command::CreateBuffer(vbo),
                Command::CreateBuffer(ebo),
                Command::BindVertexArray(Some(vao)),
                Command::BindBuffer {
                    target: glow::ARRAY_BUFFER,
                    buffer: Some(vbo),
                },
                Command::BufferData {
                    target: glow::ARRAY_BUFFER,
                    buffer: Some(vbo),
                    len: 3 * Vertex::STRIDE,
                    usage: glow::STATIC_DRAW,
                },
                Command::BindBuffer {
                    target: glow::ELEMENT_ARRAY_BUFFER,
                    buffer: Some(ebo),
                },
                Command::BufferData {
                    target: glow::ELEMENT_ARRAY_BUFFER,
                    buffer: Some(ebo),
                    len: 3 * 4,
                    usage: glow::STATIC_DRAW,
                },
                Command::EnableVertexAttribArray(0),
            ]
        );
        assert_eq!(commands.last(), Some(&Command::BindVertexArray(None)));
    }

    #[test]
    fn attributes_are_described_against_the_mesh_buffers() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&gl, vertices, indices, false).unwrap();

        let pointers = gl.attrib_pointers();
        assert_eq!(pointers.len(), 3);
        for (pointer, (index, size, offset)) in pointers.iter().zip([(0, 3, 0), (1, 3, 12), (2, 2, 24)]) {
            assert_eq!(pointer.index, index);
            assert_eq!(pointer.size, size);
            assert_eq!(pointer.offset, offset);
            assert_eq!(pointer.stride, 32);
            assert_eq!(pointer.data_type, glow::FLOAT);
            assert!(!pointer.normalized);
            assert_eq!(pointer.vertex_array, Some(mesh.vao()));
            assert_eq!(pointer.buffer, Some(mesh.vbo()));
        }
        assert_eq!(gl.element_buffer_of(mesh.vao()), Some(mesh.ebo()));
    }

    #[test]
    fn uploaded_bytes_match_the_input() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let expected_vertices = bytemuck::cast_slice::<Vertex, u8>(&vertices).to_vec();
        let expected_indices = bytemuck::cast_slice::<u32, u8>(&indices).to_vec();

        let mesh = Mesh::new(&gl, vertices, indices, false).unwrap();

        assert_eq!(gl.buffer_contents(mesh.vbo()), Some(expected_vertices));
        assert_eq!(gl.buffer_contents(mesh.ebo()), Some(expected_indices));
    }

    #[test]
    fn retained_mesh_keeps_its_geometry() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&gl, vertices.clone(), indices.clone(), Retention::Retain).unwrap();

        assert!(mesh.is_retained());
        assert_eq!(mesh.vertices(), Some(vertices.as_slice()));
        assert_eq!(mesh.indices(), Some(indices.as_slice()));
    }

    #[test]
    fn discarded_mesh_remembers_counts_only() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&gl, vertices, indices, Retention::Discard).unwrap();

        assert_eq!(mesh.data(), &MeshData::Uploaded);
        assert_eq!(mesh.vertices(), None);
        assert_eq!(mesh.indices(), None);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn usage_option_reaches_the_uploads() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let options = MeshOptions {
            usage: BufferUsage::DynamicDraw,
            ..MeshOptions::default()
        };
        let mesh = Mesh::with_options(&gl, vertices, indices, &options).unwrap();

        assert_eq!(mesh.usage(), BufferUsage::DynamicDraw);
        let usages: Vec<u32> = gl
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::BufferData { usage, .. } => Some(usage),
                _ => None,
            })
            .collect();
        assert_eq!(usages, vec![glow::DYNAMIC_DRAW, glow::DYNAMIC_DRAW]);
    }

    #[test]
    fn draw_binds_then_draws() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, indices) = triangle();
        let mesh = Mesh::new(&gl, vertices, indices, false).unwrap();
        gl.clear_commands();

        mesh.draw();

        let commands = gl.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], Command::BindVertexArray(Some(mesh.vao())));
        assert!(matches!(commands[1], Command::DrawElements(_)));
        assert_eq!(gl.bound_vertex_array(), Some(mesh.vao()));
    }

    #[test]
    fn allocation_failure_surfaces_as_error() {
        let gl = Rc::new(HeadlessContext::with_allocation_limit(2));
        let (vertices, indices) = triangle();
        let err = Mesh::new(&gl, vertices, indices, true).unwrap_err();

        assert!(matches!(err, MeshError::ResourceAllocationFailed { .. }));
        assert_eq!(gl.live_vertex_arrays(), 0);
        assert_eq!(gl.live_buffers(), 0);
        assert!(gl.draw_calls().is_empty());
    }

    #[test]
    fn options_read_from_config() {
        let options: MeshOptions = serde_json::from_str(r#"{ "retention": "retain" }"#).unwrap();
        assert_eq!(options.retention, Retention::Retain);
        assert_eq!(options.usage, BufferUsage::StaticDraw);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "mesh index out of range")]
    fn out_of_range_index_panics_in_debug() {
        let gl = Rc::new(HeadlessContext::new());
        let (vertices, _) = triangle();
        let _ = Mesh::new(&gl, vertices, vec![0, 1, 3], false);
    }
}
