/// One of the N rotating sets of per-frame resources
///
/// A slot's command list, uniform buffer and frame binding group are only
/// touched by the CPU after its fence has signaled.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, Buffer, BufferDesc, BufferUsage, CommandList, Fence, GraphicsDevice, Semaphore,
};
use crate::render_graph::BloomGraph;
use crate::uniforms::FrameUniforms;

/// Lifecycle of a slot: `Idle → Acquiring → Recording → Submitted → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Acquiring,
    Recording,
    Submitted,
}

pub struct FrameSlot {
    pub(crate) frame_bindings: Arc<dyn BindingGroup>,
    pub(crate) uniforms: Arc<dyn Buffer>,
    pub(crate) render_complete: Box<dyn Semaphore>,
    pub(crate) image_acquired: Box<dyn Semaphore>,
    /// Created signaled so the first wait returns immediately
    pub(crate) in_flight: Box<dyn Fence>,
    pub(crate) commands: Box<dyn CommandList>,
    pub(crate) state: SlotState,
}

impl FrameSlot {
    pub fn new(device: &dyn GraphicsDevice, graph: &BloomGraph) -> Result<Self> {
        let commands = device.create_command_list()?;
        let in_flight = device.create_fence(true)?;
        let image_acquired = device.create_semaphore()?;
        let render_complete = device.create_semaphore()?;
        let uniforms = device.create_buffer(BufferDesc {
            size: FrameUniforms::SIZE,
            usage: BufferUsage::Uniform,
        })?;
        let frame_bindings = graph.create_frame_bindings(&uniforms)?;
        Ok(Self {
            frame_bindings,
            uniforms,
            render_complete,
            image_acquired,
            in_flight,
            commands,
            state: SlotState::Idle,
        })
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Replace both semaphores after a frame was abandoned mid-flight.
    /// The device must be idle.
    pub(crate) fn reset_semaphores(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        self.image_acquired = device.create_semaphore()?;
        self.render_complete = device.create_semaphore()?;
        Ok(())
    }
}
