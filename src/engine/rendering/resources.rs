use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::engine::error::{MeshError, ResourceKind};
use crate::engine::rendering::GraphicsContext;

/// The vertex array, vertex buffer and element buffer backing one mesh.
///
/// Either all three handles exist or none do: [`GpuResources::allocate`] rolls
/// back whatever it created when a later allocation fails, and dropping the
/// group deletes each handle exactly once.
pub struct GpuResources<G: GraphicsContext> {
    gl: Rc<G>,
    vao: G::VertexArray,
    vbo: G::Buffer,
    ebo: G::Buffer,
}

impl<G: GraphicsContext> GpuResources<G> {
    pub fn allocate(gl: &Rc<G>) -> Result<Self, MeshError> {
        let vao = gl.create_vertex_array().map_err(|reason| MeshError::ResourceAllocationFailed {
            resource: ResourceKind::VertexArray,
            reason,
        })?;

        let vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(reason) => {
                debug!("Rolling back vertex array {:?} after vertex buffer failure", vao);
                gl.delete_vertex_array(vao);
                return Err(MeshError::ResourceAllocationFailed {
                    resource: ResourceKind::VertexBuffer,
                    reason,
                });
            }
        };

        let ebo = match gl.create_buffer() {
            Ok(ebo) => ebo,
            Err(reason) => {
                debug!(
                    "Rolling back vertex array {:?} and buffer {:?} after element buffer failure",
                    vao, vbo
                );
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
                return Err(MeshError::ResourceAllocationFailed {
                    resource: ResourceKind::ElementBuffer,
                    reason,
                });
            }
        };

        Ok(Self {
            gl: Rc::clone(gl),
            vao,
            vbo,
            ebo,
        })
    }

    pub fn context(&self) -> &G {
        &self.gl
    }

    pub fn vao(&self) -> G::VertexArray {
        self.vao
    }

    pub fn vbo(&self) -> G::Buffer {
        self.vbo
    }

    pub fn ebo(&self) -> G::Buffer {
        self.ebo
    }
}

impl<G: GraphicsContext> Drop for GpuResources<G> {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.vao);
        self.gl.delete_buffer(self.vbo);
        self.gl.delete_buffer(self.ebo);
    }
}

impl<G: GraphicsContext> fmt::Debug for GpuResources<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuResources")
            .field("vao", &self.vao)
            .field("vbo", &self.vbo)
            .field("ebo", &self.ebo)
            .finish()
    }
}
