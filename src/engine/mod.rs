pub mod components;
pub mod error;
pub mod rendering;

pub use components::*;
pub use error::{MeshError, ResourceKind};
pub use rendering::*;
