//! A [`GraphicsContext`] with no GPU behind it.
//!
//! `HeadlessContext` keeps enough GL state to answer "what would the driver
//! have seen": live handles, bindings, uploaded bytes and a log of every call.
//! It backs the crate's tests and works for tooling that needs to run meshes
//! through their lifecycle without a window.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use log::{trace, warn};

use crate::engine::rendering::GraphicsContext;

/// Handle issued by [`HeadlessContext`]. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(NonZeroU32);

impl ResourceId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttribPointer {
    pub index: u32,
    pub size: i32,
    pub data_type: u32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    /// Vertex array bound when the pointer was set.
    pub vertex_array: Option<ResourceId>,
    /// Array buffer the pointer sources from.
    pub buffer: Option<ResourceId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: u32,
    pub count: i32,
    pub element_type: u32,
    pub offset: i32,
    pub vertex_array: Option<ResourceId>,
    /// Element buffer attached to `vertex_array` at draw time.
    pub element_buffer: Option<ResourceId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateVertexArray(ResourceId),
    CreateBuffer(ResourceId),
    DeleteVertexArray(ResourceId),
    DeleteBuffer(ResourceId),
    BindVertexArray(Option<ResourceId>),
    BindBuffer {
        target: u32,
        buffer: Option<ResourceId>,
    },
    BufferData {
        target: u32,
        buffer: Option<ResourceId>,
        len: usize,
        usage: u32,
    },
    EnableVertexAttribArray(u32),
    VertexAttribPointer(AttribPointer),
    DrawElements(DrawCall),
}

#[derive(Debug, Default)]
struct State {
    allocation_limit: Option<usize>,
    created: usize,
    vertex_arrays: HashSet<ResourceId>,
    buffers: HashMap<ResourceId, Vec<u8>>,
    bound_vertex_array: Option<ResourceId>,
    array_buffer: Option<ResourceId>,
    // Element buffer binding with no vertex array bound.
    default_element_buffer: Option<ResourceId>,
    element_buffers: HashMap<ResourceId, ResourceId>,
    invalid_deletes: usize,
    commands: Vec<Command>,
}

impl State {
    fn allocate(&mut self) -> Result<ResourceId, String> {
        if let Some(limit) = self.allocation_limit {
            if self.created >= limit {
                return Err(format!("allocation limit of {} resources reached", limit));
            }
        }
        let id = ResourceId(NonZeroU32::MIN.saturating_add(self.created as u32));
        self.created += 1;
        Ok(id)
    }

    fn element_buffer(&self) -> Option<ResourceId> {
        match self.bound_vertex_array {
            Some(vao) => self.element_buffers.get(&vao).copied(),
            None => self.default_element_buffer,
        }
    }

    fn record(&mut self, command: Command) {
        trace!("headless: {:?}", command);
        self.commands.push(command);
    }
}

#[derive(Debug, Default)]
pub struct HeadlessContext {
    state: RefCell<State>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose creation calls start failing once `limit` handles have
    /// been issued.
    pub fn with_allocation_limit(limit: usize) -> Self {
        let context = Self::new();
        context.state.borrow_mut().allocation_limit = Some(limit);
        context
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Handles issued over the context's lifetime, deleted or not.
    pub fn total_created(&self) -> usize {
        self.state.borrow().created
    }

    /// Deletes of handles that were never created or were already deleted.
    pub fn invalid_deletes(&self) -> usize {
        self.state.borrow().invalid_deletes
    }

    pub fn bound_vertex_array(&self) -> Option<ResourceId> {
        self.state.borrow().bound_vertex_array
    }

    pub fn buffer_contents(&self, buffer: ResourceId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn element_buffer_of(&self, vertex_array: ResourceId) -> Option<ResourceId> {
        self.state.borrow().element_buffers.get(&vertex_array).copied()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::DrawElements(call) => Some(*call),
                _ => None,
            })
            .collect()
    }

    pub fn attrib_pointers(&self) -> Vec<AttribPointer> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::VertexAttribPointer(pointer) => Some(*pointer),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsContext for HeadlessContext {
    type VertexArray = ResourceId;
    type Buffer = ResourceId;

    fn create_vertex_array(&self) -> Result<ResourceId, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate()?;
        state.vertex_arrays.insert(id);
        state.record(Command::CreateVertexArray(id));
        Ok(id)
    }

    fn create_buffer(&self) -> Result<ResourceId, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate()?;
        state.buffers.insert(id, Vec::new());
        state.record(Command::CreateBuffer(id));
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: ResourceId) {
        let mut state = self.state.borrow_mut();
        state.record(Command::DeleteVertexArray(vertex_array));
        if !state.vertex_arrays.remove(&vertex_array) {
            warn!("headless: delete of unknown vertex array {:?}", vertex_array);
            state.invalid_deletes += 1;
            return;
        }
        state.element_buffers.remove(&vertex_array);
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn delete_buffer(&self, buffer: ResourceId) {
        let mut state = self.state.borrow_mut();
        state.record(Command::DeleteBuffer(buffer));
        if state.buffers.remove(&buffer).is_none() {
            warn!("headless: delete of unknown buffer {:?}", buffer);
            state.invalid_deletes += 1;
            return;
        }
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        if state.default_element_buffer == Some(buffer) {
            state.default_element_buffer = None;
        }
        if let Some(vao) = state.bound_vertex_array {
            if state.element_buffers.get(&vao) == Some(&buffer) {
                state.element_buffers.remove(&vao);
            }
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<ResourceId>) {
        let mut state = self.state.borrow_mut();
        state.record(Command::BindVertexArray(vertex_array));
        state.bound_vertex_array = vertex_array;
    }

    fn bind_buffer(&self, target: u32, buffer: Option<ResourceId>) {
        let mut state = self.state.borrow_mut();
        state.record(Command::BindBuffer { target, buffer });
        match target {
            glow::ARRAY_BUFFER => state.array_buffer = buffer,
            glow::ELEMENT_ARRAY_BUFFER => match (state.bound_vertex_array, buffer) {
                (Some(vao), Some(buffer)) => {
                    state.element_buffers.insert(vao, buffer);
                }
                (Some(vao), None) => {
                    state.element_buffers.remove(&vao);
                }
                (None, buffer) => state.default_element_buffer = buffer,
            },
            _ => {}
        }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        let mut state = self.state.borrow_mut();
        let buffer = match target {
            glow::ARRAY_BUFFER => state.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => state.element_buffer(),
            _ => None,
        };
        state.record(Command::BufferData {
            target,
            buffer,
            len: data.len(),
            usage,
        });
        if let Some(storage) = buffer.and_then(|id| state.buffers.get_mut(&id)) {
            storage.clear();
            storage.extend_from_slice(data);
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state
            .borrow_mut()
            .record(Command::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut state = self.state.borrow_mut();
        let pointer = AttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
            vertex_array: state.bound_vertex_array,
            buffer: state.array_buffer,
        };
        state.record(Command::VertexAttribPointer(pointer));
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let call = DrawCall {
            mode,
            count,
            element_type,
            offset,
            vertex_array: state.bound_vertex_array,
            element_buffer: state.element_buffer(),
        };
        state.record(Command::DrawElements(call));
    }
}
