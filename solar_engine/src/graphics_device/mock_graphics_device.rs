/// Mock graphics device for unit tests (no GPU required)
///
/// Every object reports into a shared [`MockDeviceState`]: live object
/// counts, submitted command streams and synchronization violations
/// (re-recording an in-flight command list, waiting on an unsignaled
/// semaphore, submitting with a signaled fence). "GPU work" completes
/// lazily when a fence is waited on or the device is idled.
///
/// Draws into an `R32_UINT` color attachment are rasterized on the CPU
/// (position = first 12 bytes of each vertex, clip matrix + object ID in the
/// push constants), so picking can be checked end to end.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use glam::{Mat4, Vec4};
use winit::window::Window;

use crate::error::{Error, Result};
use crate::graphics_device::{
    validate_binding_resources, AcquireResult, BindingGroup, BindingGroupLayoutDesc,
    BindingResource, Buffer, BufferDesc, BufferUsage, ClearValue, CommandList, DeviceLimits,
    Extent2D, Fence, FenceStatus, Framebuffer, FramebufferDesc, GraphicsDevice, ImageBarrier,
    IndexType, Pipeline, PipelineDesc, PresentResult, PrimitiveTopology, Rect2D, RenderPass,
    RenderPassDesc, RenderTarget, SampleCount, Semaphore, Shader, ShaderDesc, ShaderStage,
    SpecializationConstant, SubmitInfo, Swapchain, Texture, TextureDesc, TextureFormat,
    TextureInfo, TextureUsage, Viewport,
};
use crate::graphics_device::buffer::check_range;

// ============================================================================
// Shared device state
// ============================================================================

/// One `submit` call as seen by the mock
#[derive(Debug, Clone)]
pub struct MockSubmission {
    /// Concatenated command streams of every submitted list
    pub commands: Vec<String>,
    pub fenced: bool,
}

#[derive(Default)]
pub struct MockDeviceState {
    pub live_buffers: i64,
    pub live_textures: i64,
    pub live_render_targets: i64,
    pub live_framebuffers: i64,
    pub live_binding_groups: i64,
    pub live_pipelines: i64,
    pub framebuffers_created: u64,
    pub textures_created: u64,
    pub pipelines_created: u64,
    pub submissions: Vec<MockSubmission>,
    pub violations: Vec<String>,
    pub wait_idle_calls: u64,
    pub render_passes: Vec<RenderPassDesc>,
    fences: Vec<Weak<MockFenceShared>>,
    unfenced_lists: Vec<Arc<AtomicBool>>,
}

type SharedState = Arc<Mutex<MockDeviceState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockDeviceState> {
    // A panicking test must not cascade into every later lock
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn violation(state: &SharedState, message: String) {
    lock(state).violations.push(message);
}

fn downcast<'a, T: 'static>(any: &'a dyn Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>()
        .ok_or_else(|| Error::BackendError(format!("{} is not a mock object", what)))
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub size: u64,
    pub usage: BufferUsage,
    data: Mutex<Vec<u8>>,
    state: SharedState,
}

impl MockBuffer {
    pub fn bytes(&self) -> Vec<u8> {
        self.data.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_range(self.size, offset, data.len() as u64)?;
        let mut bytes = self.data.lock().unwrap_or_else(|p| p.into_inner());
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        check_range(self.size, offset, len as u64)?;
        let bytes = self.data.lock().unwrap_or_else(|p| p.into_inner());
        let start = offset as usize;
        Ok(bytes[start..start + len].to_vec())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        lock(&self.state).live_buffers -= 1;
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    /// Object IDs for R32_UINT targets
    ids: Mutex<Vec<u32>>,
    /// Depth used by the CPU rasterizer
    depth: Mutex<Vec<f32>>,
    state: SharedState,
}

impl MockTexture {
    pub fn id_at(&self, x: u32, y: u32) -> u32 {
        let ids = self.ids.lock().unwrap_or_else(|p| p.into_inner());
        ids.get((y * self.info.width + x) as usize).copied().unwrap_or(0)
    }

    fn clear_ids(&self, value: u32, depth: f32) {
        let count = (self.info.width * self.info.height) as usize;
        *self.ids.lock().unwrap_or_else(|p| p.into_inner()) = vec![value; count];
        *self.depth.lock().unwrap_or_else(|p| p.into_inner()) = vec![depth; count];
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        lock(&self.state).live_textures -= 1;
    }
}

// ============================================================================
// Mock RenderTarget
// ============================================================================

pub struct MockRenderTarget {
    texture: Option<Arc<dyn Texture>>,
    width: u32,
    height: u32,
    format: TextureFormat,
    samples: SampleCount,
    state: SharedState,
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn samples(&self) -> SampleCount {
        self.samples
    }

    fn texture(&self) -> Option<&Arc<dyn Texture>> {
        self.texture.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockRenderTarget {
    fn drop(&mut self) {
        lock(&self.state).live_render_targets -= 1;
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer / Shader / Pipeline / BindingGroup
// ============================================================================

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl MockRenderPass {
    fn attachment_count(&self) -> usize {
        self.desc.color_attachments.len()
            + self.desc.depth_attachment.iter().count()
            + self.desc.resolve_attachments.len()
    }
}

impl RenderPass for MockRenderPass {
    fn color_attachment_count(&self) -> u32 {
        self.desc.color_attachments.len() as u32
    }

    fn samples(&self) -> SampleCount {
        self.desc
            .color_attachments
            .first()
            .map(|a| a.samples)
            .unwrap_or(SampleCount::S1)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<Arc<dyn RenderTarget>>,
    state: SharedState,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        lock(&self.state).live_framebuffers -= 1;
    }
}

pub struct MockShader {
    pub label: String,
    stage: ShaderStage,
    entry_point: String,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipeline {
    pub label: String,
    pub layouts: Vec<BindingGroupLayoutDesc>,
    pub vertex_stride: Option<u32>,
    pub topology: PrimitiveTopology,
    pub samples: SampleCount,
    pub specialization: Vec<SpecializationConstant>,
    state: SharedState,
}

impl Pipeline for MockPipeline {
    fn label(&self) -> &str {
        &self.label
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.layouts.len() as u32
    }

    fn binding_group_layout(&self, set_index: u32) -> Option<&BindingGroupLayoutDesc> {
        self.layouts.get(set_index as usize)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        lock(&self.state).live_pipelines -= 1;
    }
}

pub struct MockBindingGroup {
    pub set_index: u32,
    pub resources: Vec<BindingResource>,
    state: SharedState,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBindingGroup {
    fn drop(&mut self) {
        lock(&self.state).live_binding_groups -= 1;
    }
}

// ============================================================================
// Mock sync objects
// ============================================================================

struct MockFenceShared {
    signaled: AtomicBool,
    /// In-flight flags of the command lists this fence guards
    pending: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockFenceShared {
    fn complete(&self) {
        for flag in self.pending.lock().unwrap_or_else(|p| p.into_inner()).drain(..) {
            flag.store(false, Ordering::SeqCst);
        }
        self.signaled.store(true, Ordering::SeqCst);
    }
}

pub struct MockFence {
    shared: Arc<MockFenceShared>,
    hung: Arc<AtomicBool>,
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<FenceStatus> {
        if self.shared.signaled.load(Ordering::SeqCst) {
            return Ok(FenceStatus::Signaled);
        }
        if self.hung.load(Ordering::SeqCst) {
            return Ok(FenceStatus::TimedOut);
        }
        self.shared.complete();
        Ok(FenceStatus::Signaled)
    }

    fn reset(&self) -> Result<()> {
        self.shared.signaled.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_signaled(&self) -> Result<bool> {
        Ok(self.shared.signaled.load(Ordering::SeqCst))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
pub struct MockSemaphore {
    signaled: AtomicBool,
}

impl MockSemaphore {
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn signal(semaphore: &dyn Semaphore, state: &SharedState, what: &str) -> Result<()> {
    let sem = downcast::<MockSemaphore>(semaphore.as_any(), "semaphore")?;
    if sem.signaled.swap(true, Ordering::SeqCst) {
        violation(state, format!("{}: semaphore signaled twice without a wait", what));
    }
    Ok(())
}

fn consume(semaphore: &dyn Semaphore, state: &SharedState, what: &str) -> Result<()> {
    let sem = downcast::<MockSemaphore>(semaphore.as_any(), "semaphore")?;
    if !sem.signaled.swap(false, Ordering::SeqCst) {
        violation(state, format!("{}: wait on a semaphore nobody signaled", what));
    }
    Ok(())
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Default)]
struct MockBindings {
    framebuffer: Option<Arc<dyn Framebuffer>>,
    pipeline: Option<Arc<dyn Pipeline>>,
    vertex_buffer: Option<Arc<dyn Buffer>>,
    index_buffer: Option<(Arc<dyn Buffer>, IndexType)>,
    viewport: Option<Viewport>,
    scissor: Option<Rect2D>,
    push: Vec<u8>,
}

pub struct MockCommandList {
    pub commands: Vec<String>,
    recording: bool,
    in_flight: Arc<AtomicBool>,
    bindings: MockBindings,
    state: SharedState,
}

impl MockCommandList {
    fn require_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(format!("{} outside begin/end", command)));
        }
        Ok(())
    }

    fn require_pass(&self, command: &str, inside: bool) -> Result<()> {
        self.require_recording(command)?;
        if self.bindings.framebuffer.is_some() != inside {
            return Err(Error::BackendError(format!(
                "{} must be recorded {} a render pass",
                command,
                if inside { "inside" } else { "outside" }
            )));
        }
        Ok(())
    }

    /// ID target of the current framebuffer, if it is an R32_UINT pass
    fn id_target(&self) -> Option<Arc<dyn Texture>> {
        let framebuffer = self.bindings.framebuffer.as_ref()?;
        let framebuffer = framebuffer.as_any().downcast_ref::<MockFramebuffer>()?;
        let texture = framebuffer.attachments.first()?.texture()?.clone();
        (texture.info().format == TextureFormat::R32_UINT).then_some(texture)
    }

    fn rasterize_ids(&self, target: &Arc<dyn Texture>, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        let texture = downcast::<MockTexture>(target.as_any(), "texture")?;
        let pipeline = self.bindings.pipeline.as_ref()
            .ok_or_else(|| Error::BackendError("draw without pipeline".into()))?;
        let stride = downcast::<MockPipeline>(pipeline.as_any(), "pipeline")?
            .vertex_stride
            .ok_or_else(|| Error::BackendError("picking draw without vertex layout".into()))? as usize;
        let vertices = match &self.bindings.vertex_buffer {
            Some(buffer) => downcast::<MockBuffer>(buffer.as_any(), "buffer")?.bytes(),
            None => return Err(Error::BackendError("draw without vertex buffer".into())),
        };
        let (indices, index_type) = match &self.bindings.index_buffer {
            Some((buffer, ty)) => (downcast::<MockBuffer>(buffer.as_any(), "buffer")?.bytes(), *ty),
            None => return Err(Error::BackendError("draw_indexed without index buffer".into())),
        };
        if self.bindings.push.len() < 68 {
            return Err(Error::BackendError("picking draw without clip matrix + ID".into()));
        }
        let clip: [f32; 16] = bytemuck::pod_read_unaligned(&self.bindings.push[0..64]);
        let clip = Mat4::from_cols_array(&clip);
        let id: u32 = bytemuck::pod_read_unaligned(&self.bindings.push[64..68]);

        let (width, height) = (texture.info.width, texture.info.height);
        let viewport = self.bindings.viewport.unwrap_or(Viewport::full(width, height));
        let scissor = self.bindings.scissor.unwrap_or(Rect2D::full(width, height));

        let index_at = |i: usize| -> u32 {
            match index_type {
                IndexType::U32 => bytemuck::pod_read_unaligned(&indices[i * 4..i * 4 + 4]),
                IndexType::U16 => {
                    let v: u16 = bytemuck::pod_read_unaligned(&indices[i * 2..i * 2 + 2]);
                    v as u32
                }
            }
        };
        let screen = |vertex: u32| -> Option<(f32, f32, f32)> {
            let base = (vertex as i64 + vertex_offset as i64) as usize * stride;
            let p: [f32; 3] = bytemuck::pod_read_unaligned(vertices.get(base..base + 12)?);
            let c = clip * Vec4::new(p[0], p[1], p[2], 1.0);
            if c.w <= 1e-6 {
                return None;
            }
            let ndc = c.truncate() / c.w;
            Some((
                viewport.x + (ndc.x + 1.0) * 0.5 * viewport.width,
                viewport.y + (ndc.y + 1.0) * 0.5 * viewport.height,
                ndc.z,
            ))
        };

        let mut ids = texture.ids.lock().unwrap_or_else(|p| p.into_inner());
        let mut depth = texture.depth.lock().unwrap_or_else(|p| p.into_inner());
        let first = first_index as usize;
        for tri in 0..(index_count as usize / 3) {
            let corners = [
                screen(index_at(first + tri * 3)),
                screen(index_at(first + tri * 3 + 1)),
                screen(index_at(first + tri * 3 + 2)),
            ];
            let [Some(a), Some(b), Some(c)] = corners else { continue };
            let area = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
            if area.abs() < 1e-12 {
                continue;
            }
            let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as i64;
            let max_x = a.0.max(b.0).max(c.0).ceil().min(width as f32) as i64;
            let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as i64;
            let max_y = a.1.max(b.1).max(c.1).ceil().min(height as f32) as i64;
            for py in min_y..max_y {
                for px in min_x..max_x {
                    if !scissor.contains(px, py) {
                        continue;
                    }
                    let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
                    let w0 = ((b.0 - x) * (c.1 - y) - (b.1 - y) * (c.0 - x)) / area;
                    let w1 = ((c.0 - x) * (a.1 - y) - (c.1 - y) * (a.0 - x)) / area;
                    let w2 = 1.0 - w0 - w1;
                    if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                        continue;
                    }
                    let z = w0 * a.2 + w1 * b.2 + w2 * c.2;
                    let slot = (py as u32 * width + px as u32) as usize;
                    if (0.0..=1.0).contains(&z) && z < depth[slot] {
                        depth[slot] = z;
                        ids[slot] = id;
                    }
                }
            }
        }
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.in_flight.load(Ordering::SeqCst) {
            violation(&self.state, "command list re-recorded while in flight".to_string());
        }
        self.commands.clear();
        self.bindings = MockBindings::default();
        self.recording = true;
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_pass("end", false)?;
        self.recording = false;
        self.commands.push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_pass("begin_render_pass", false)?;
        let pass = downcast::<MockRenderPass>(render_pass.as_any(), "render pass")?;
        let fb = downcast::<MockFramebuffer>(framebuffer.as_any(), "framebuffer")?;
        if fb.attachments.len() != pass.attachment_count() {
            return Err(Error::BackendError(format!(
                "framebuffer '{}' incompatible with render pass '{}'",
                fb.label, pass.desc.label
            )));
        }
        self.commands.push(format!("begin_render_pass:{}", fb.label));
        self.bindings.framebuffer = Some(framebuffer.clone());
        if let Some(target) = self.id_target() {
            let value = clear_values.iter().find_map(|c| match c {
                ClearValue::ColorUint(v) => Some(v[0]),
                _ => None,
            });
            let depth = clear_values.iter().find_map(|c| match c {
                ClearValue::DepthStencil { depth, .. } => Some(*depth),
                _ => None,
            });
            downcast::<MockTexture>(target.as_any(), "texture")?
                .clear_ids(value.unwrap_or(0), depth.unwrap_or(1.0));
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_pass("end_render_pass", true)?;
        self.bindings.framebuffer = None;
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.bindings.viewport = Some(viewport);
        self.commands.push("set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        self.bindings.scissor = Some(scissor);
        self.commands.push(format!(
            "set_scissor:{},{},{},{}",
            scissor.x, scissor.y, scissor.width, scissor.height
        ));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.require_pass("bind_pipeline", true)?;
        self.commands.push(format!("bind_pipeline:{}", pipeline.label()));
        self.bindings.pipeline = Some(pipeline.clone());
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        self.require_pass("bind_binding_group", true)?;
        if set_index >= pipeline.binding_group_layout_count() || binding_group.set_index() != set_index {
            return Err(Error::BackendError(format!(
                "binding group for set {} bound at set {} of '{}'",
                binding_group.set_index(),
                set_index,
                pipeline.label()
            )));
        }
        self.commands.push(format!("bind_binding_group:{}", set_index));
        Ok(())
    }

    fn push_constants(&mut self, _stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.require_pass("push_constants", true)?;
        let end = offset as usize + data.len();
        if end > 128 {
            return Err(Error::BackendError(format!("push constants exceed 128 bytes ({})", end)));
        }
        if self.bindings.push.len() < end {
            self.bindings.push.resize(end, 0);
        }
        self.bindings.push[offset as usize..end].copy_from_slice(data);
        self.commands.push("push_constants".to_string());
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.require_pass("bind_vertex_buffer", true)?;
        self.bindings.vertex_buffer = Some(buffer.clone());
        self.commands.push("bind_vertex_buffer".to_string());
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, _offset: u64, index_type: IndexType) -> Result<()> {
        self.require_pass("bind_index_buffer", true)?;
        self.bindings.index_buffer = Some((buffer.clone(), index_type));
        self.commands.push("bind_index_buffer".to_string());
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.require_pass("draw", true)?;
        if self.bindings.pipeline.is_none() {
            return Err(Error::BackendError("draw without pipeline".into()));
        }
        self.commands.push(format!("draw:{}", vertex_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_pass("draw_indexed", true)?;
        if self.bindings.pipeline.is_none() {
            return Err(Error::BackendError("draw without pipeline".into()));
        }
        if let Some(target) = self.id_target() {
            self.rasterize_ids(&target, index_count, first_index, vertex_offset)?;
        }
        self.commands.push(format!("draw_indexed:{}", index_count));
        Ok(())
    }

    fn image_barrier(&mut self, barrier: &ImageBarrier) -> Result<()> {
        self.require_pass("image_barrier", false)?;
        self.commands.push(format!(
            "barrier:{}:{:?}->{:?}",
            barrier.texture.info().label,
            barrier.old_layout,
            barrier.new_layout
        ));
        Ok(())
    }

    fn copy_texture_to_buffer(
        &mut self,
        texture: &Arc<dyn Texture>,
        region: Rect2D,
        buffer: &Arc<dyn Buffer>,
        buffer_offset: u64,
    ) -> Result<()> {
        self.require_pass("copy_texture_to_buffer", false)?;
        let source = downcast::<MockTexture>(texture.as_any(), "texture")?;
        let (width, height) = (source.info.width, source.info.height);
        if region.x < 0
            || region.y < 0
            || region.x as u32 + region.width > width
            || region.y as u32 + region.height > height
        {
            return Err(Error::InvalidResource("copy region outside texture".into()));
        }
        let mut bytes = Vec::with_capacity((region.width * region.height * 4) as usize);
        for y in region.y as u32..region.y as u32 + region.height {
            for x in region.x as u32..region.x as u32 + region.width {
                bytes.extend_from_slice(&source.id_at(x, y).to_le_bytes());
            }
        }
        buffer.update(buffer_offset, &bytes)?;
        self.commands.push(format!("copy_texture_to_buffer:{}", source.info.label));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

/// Test-side knobs for a [`MockSwapchain`]
#[derive(Default)]
pub struct MockSwapchainControl {
    /// Next acquire reports OutOfDate (cleared once reported)
    pub out_of_date_on_acquire: AtomicBool,
    /// Next present reports Suboptimal (cleared once reported)
    pub suboptimal_on_present: AtomicBool,
    pub recreate_count: Mutex<u32>,
    pub present_count: Mutex<u64>,
}

pub struct MockSwapchain {
    extent: Extent2D,
    image_count: usize,
    next_image: u32,
    images: Vec<Arc<dyn RenderTarget>>,
    pub control: Arc<MockSwapchainControl>,
    state: SharedState,
}

impl MockSwapchain {
    fn build_images(state: &SharedState, extent: Extent2D, count: usize) -> Vec<Arc<dyn RenderTarget>> {
        lock(state).live_render_targets += count as i64;
        (0..count)
            .map(|_| {
                Arc::new(MockRenderTarget {
                    texture: None,
                    width: extent.width,
                    height: extent.height,
                    format: TextureFormat::B8G8R8A8_SRGB,
                    samples: SampleCount::S1,
                    state: state.clone(),
                }) as Arc<dyn RenderTarget>
            })
            .collect()
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, signal_semaphore: &dyn Semaphore) -> Result<AcquireResult> {
        if self.control.out_of_date_on_acquire.swap(false, Ordering::SeqCst) {
            return Ok(AcquireResult::OutOfDate);
        }
        signal(signal_semaphore, &self.state, "acquire")?;
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count as u32;
        Ok(AcquireResult::Image(index))
    }

    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentResult> {
        if image_index as usize >= self.image_count {
            return Err(Error::InvalidResource(format!("present of image {}", image_index)));
        }
        consume(wait, &self.state, "present")?;
        *self.control.present_count.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        if self.control.suboptimal_on_present.swap(false, Ordering::SeqCst) {
            return Ok(PresentResult::Suboptimal);
        }
        Ok(PresentResult::Optimal)
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::SurfaceOutOfDate);
        }
        self.images.clear();
        self.extent = Extent2D::new(width, height);
        self.images = Self::build_images(&self.state, self.extent, self.image_count);
        self.next_image = 0;
        *self.control.recreate_count.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        TextureFormat::B8G8R8A8_SRGB
    }

    fn render_target(&self, index: usize) -> Result<Arc<dyn RenderTarget>> {
        self.images
            .get(index)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("swapchain image {}", index)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    state: SharedState,
    hung: Arc<AtomicBool>,
    max_samples: Mutex<SampleCount>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState::default())),
            hung: Arc::new(AtomicBool::new(false)),
            max_samples: Mutex::new(SampleCount::S8),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        lock(&self.state)
    }

    /// Make every unsignaled fence time out
    pub fn set_hung(&self, hung: bool) {
        self.hung.store(hung, Ordering::SeqCst);
    }

    pub fn set_max_samples(&self, samples: SampleCount) {
        *self.max_samples.lock().unwrap_or_else(|p| p.into_inner()) = samples;
    }

    /// Swapchain without a window
    pub fn create_mock_swapchain(
        &self,
        width: u32,
        height: u32,
        image_count: usize,
    ) -> (Box<dyn Swapchain>, Arc<MockSwapchainControl>) {
        let control = Arc::new(MockSwapchainControl::default());
        let extent = Extent2D::new(width, height);
        let swapchain = MockSwapchain {
            extent,
            image_count,
            next_image: 0,
            images: MockSwapchain::build_images(&self.state, extent, image_count),
            control: control.clone(),
            state: self.state.clone(),
        };
        (Box::new(swapchain), control)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("zero-sized buffer".into()));
        }
        lock(&self.state).live_buffers += 1;
        Ok(Arc::new(MockBuffer {
            size: desc.size,
            usage: desc.usage,
            data: Mutex::new(vec![0; desc.size as usize]),
            state: self.state.clone(),
        }))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!("texture '{}' has zero area", desc.label)));
        }
        if let Some(data) = &desc.data {
            let expected = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
            if data.len() != expected || desc.usage != TextureUsage::Sampled {
                return Err(Error::InvalidResource(format!("bad initial data for '{}'", desc.label)));
            }
        }
        {
            let mut state = lock(&self.state);
            state.live_textures += 1;
            state.textures_created += 1;
        }
        let texture = MockTexture {
            info: TextureInfo::from(&desc),
            ids: Mutex::new(Vec::new()),
            depth: Mutex::new(Vec::new()),
            state: self.state.clone(),
        };
        if desc.format == TextureFormat::R32_UINT {
            texture.clear_ids(0, 1.0);
        }
        Ok(Arc::new(texture))
    }

    fn create_render_target(&self, texture: &Arc<dyn Texture>) -> Result<Arc<dyn RenderTarget>> {
        let info = texture.info();
        if info.usage == TextureUsage::Sampled {
            return Err(Error::InvalidResource(format!("'{}' is not an attachment", info.label)));
        }
        lock(&self.state).live_render_targets += 1;
        Ok(Arc::new(MockRenderTarget {
            texture: Some(texture.clone()),
            width: info.width,
            height: info.height,
            format: info.format,
            samples: info.samples,
            state: self.state.clone(),
        }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        if !desc.resolve_attachments.is_empty()
            && desc.resolve_attachments.len() != desc.color_attachments.len()
        {
            return Err(Error::InvalidResource("resolve count must match color count".into()));
        }
        lock(&self.state).render_passes.push(desc.clone());
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let pass = downcast::<MockRenderPass>(desc.render_pass.as_any(), "render pass")?;
        if desc.attachments.len() != pass.attachment_count() {
            return Err(Error::InvalidResource(format!(
                "framebuffer '{}' has {} attachments, render pass expects {}",
                desc.label,
                desc.attachments.len(),
                pass.attachment_count()
            )));
        }
        if desc.attachments.iter().any(|a| a.width() != desc.width || a.height() != desc.height) {
            return Err(Error::InvalidResource(format!("framebuffer '{}' extent mismatch", desc.label)));
        }
        {
            let mut state = lock(&self.state);
            state.live_framebuffers += 1;
            state.framebuffers_created += 1;
        }
        Ok(Arc::new(MockFramebuffer {
            label: desc.label.to_string(),
            width: desc.width,
            height: desc.height,
            attachments: desc.attachments.clone(),
            state: self.state.clone(),
        }))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            return Err(Error::InvalidResource(format!("shader '{}' is not SPIR-V", desc.label)));
        }
        Ok(Arc::new(MockShader {
            label: desc.label.to_string(),
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
        }))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        if desc.render_pass.samples() != desc.samples {
            return Err(Error::InvalidResource(format!(
                "pipeline '{}' sample count differs from its render pass",
                desc.label
            )));
        }
        {
            let mut state = lock(&self.state);
            state.live_pipelines += 1;
            state.pipelines_created += 1;
        }
        Ok(Arc::new(MockPipeline {
            label: desc.label.clone(),
            layouts: desc.binding_group_layouts.clone(),
            vertex_stride: desc.vertex_layout.stride(),
            topology: desc.topology,
            samples: desc.samples,
            specialization: desc.specialization.clone(),
            state: self.state.clone(),
        }))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        let layout = pipeline.binding_group_layout(set_index).ok_or_else(|| {
            Error::InvalidResource(format!("pipeline '{}' has no set {}", pipeline.label(), set_index))
        })?;
        validate_binding_resources(layout, resources)?;
        lock(&self.state).live_binding_groups += 1;
        Ok(Arc::new(MockBindingGroup {
            set_index,
            resources: resources.to_vec(),
            state: self.state.clone(),
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            commands: Vec::new(),
            recording: false,
            in_flight: Arc::new(AtomicBool::new(false)),
            bindings: MockBindings::default(),
            state: self.state.clone(),
        }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        let shared = Arc::new(MockFenceShared {
            signaled: AtomicBool::new(signaled),
            pending: Mutex::new(Vec::new()),
        });
        lock(&self.state).fences.push(Arc::downgrade(&shared));
        Ok(Box::new(MockFence { shared, hung: self.hung.clone() }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(MockSemaphore::default()))
    }

    fn create_swapchain(&self, window: &Window) -> Result<Box<dyn Swapchain>> {
        let size = window.inner_size();
        Ok(self.create_mock_swapchain(size.width, size.height, 3).0)
    }

    fn submit(&self, info: &SubmitInfo) -> Result<()> {
        let fence = match info.fence {
            Some(fence) => Some(downcast::<MockFence>(fence.as_any(), "fence")?),
            None => None,
        };
        if let Some(fence) = fence {
            if fence.shared.signaled.load(Ordering::SeqCst) {
                violation(&self.state, "submit with a fence that is still signaled".to_string());
            }
        }

        let mut commands = Vec::new();
        for list in info.command_lists {
            let list = downcast::<MockCommandList>(list.as_any(), "command list")?;
            if list.recording {
                violation(&self.state, "submit of a command list still recording".to_string());
            }
            if list.in_flight.swap(true, Ordering::SeqCst) {
                violation(&self.state, "command list submitted twice while in flight".to_string());
            }
            match fence {
                Some(fence) => fence
                    .shared
                    .pending
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .push(list.in_flight.clone()),
                None => lock(&self.state).unfenced_lists.push(list.in_flight.clone()),
            }
            commands.extend(list.commands.iter().cloned());
        }
        for (semaphore, _) in info.wait_semaphores {
            consume(*semaphore, &self.state, "submit")?;
        }
        for semaphore in info.signal_semaphores {
            signal(*semaphore, &self.state, "submit")?;
        }

        lock(&self.state).submissions.push(MockSubmission {
            commands,
            fenced: fence.is_some(),
        });
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        if self.hung.load(Ordering::SeqCst) {
            return Err(Error::DeviceLost("mock device hung".into()));
        }
        let (fences, lists) = {
            let mut state = lock(&self.state);
            state.wait_idle_calls += 1;
            state.fences.retain(|f| f.strong_count() > 0);
            let fences: Vec<_> = state.fences.iter().filter_map(Weak::upgrade).collect();
            (fences, std::mem::take(&mut state.unfenced_lists))
        };
        for fence in fences {
            if !fence.signaled.load(Ordering::SeqCst) && !fence.pending.lock().unwrap_or_else(|p| p.into_inner()).is_empty() {
                fence.complete();
            }
        }
        for flag in lists {
            flag.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    fn limits(&self) -> DeviceLimits {
        DeviceLimits {
            max_msaa_samples: *self.max_samples.lock().unwrap_or_else(|p| p.into_inner()),
            max_push_constants_size: 128,
        }
    }

    fn pipeline_cache_data(&self) -> Result<Vec<u8>> {
        Ok(b"mock-pipeline-cache".to_vec())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
