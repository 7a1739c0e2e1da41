//! Indexed triangle meshes for OpenGL through [`glow`].
//!
//! A [`Mesh`] uploads its vertices and indices into a vertex array, a vertex
//! buffer and an element buffer when it is built, and deletes all three when
//! it is dropped. Whether the CPU copy of the geometry survives the upload is
//! chosen per mesh with [`Retention`].
//!
//! Meshes talk to the GPU through [`GraphicsContext`], implemented for
//! `glow::Context` and for [`HeadlessContext`], which records calls instead of
//! issuing them.
//!
//! ```
//! use std::rc::Rc;
//! use gl_mesh::{HeadlessContext, Mesh, MeshOptions, Shape};
//!
//! let gl = Rc::new(HeadlessContext::new());
//! let cube = Mesh::from_shape(&gl, &Shape::Cube { half_extent: 0.5 }, &MeshOptions::default())?;
//! cube.draw();
//! assert_eq!(gl.draw_calls()[0].count, 36);
//! # Ok::<(), gl_mesh::MeshError>(())
//! ```

pub mod engine;

pub use engine::*;
