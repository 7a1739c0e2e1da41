pub mod mesh;
pub mod shapes;
pub mod vertex;

pub use mesh::{Mesh, MeshData, MeshOptions, Retention};
pub use shapes::Shape;
pub use vertex::{Vertex, VertexAttribute};
