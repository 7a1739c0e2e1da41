use std::fmt;

use thiserror::Error;

/// Which GPU object a failed allocation was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    VertexArray,
    VertexBuffer,
    ElementBuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::VertexBuffer => "vertex buffer",
            ResourceKind::ElementBuffer => "element buffer",
        })
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to allocate {resource}: {reason}")]
    ResourceAllocationFailed {
        resource: ResourceKind,
        reason: String,
    },
    #[error("{0} indices do not fit in a single draw call")]
    TooManyIndices(usize),
}
