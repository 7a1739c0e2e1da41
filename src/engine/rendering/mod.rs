pub mod context;
pub mod headless;
pub mod resources;

pub use context::{BufferUsage, GraphicsContext};
pub use headless::{AttribPointer, Command, DrawCall, HeadlessContext, ResourceId};
pub use resources::GpuResources;
