//! FrameOrchestrator - the frames-in-flight loop.
//!
//! One iteration: wait for the slot's fence, acquire a swapchain image,
//! update the scene and the slot's uniforms, record the bloom graph, submit
//! (waiting on image-acquired, signaling render-complete and the fence),
//! present, advance the slot. The slot's fence wait is the only thing that
//! lets the CPU touch a slot's command list and uniform buffer again.
//!
//! Error policy of one iteration:
//! - out-of-date / suboptimal surfaces rebuild the targets, never an error
//! - a fence wait timing out is a lost device (fatal)
//! - other fatal errors propagate; anything else drops the frame

use std::sync::Arc;
use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::frame::{FrameSlot, FrameStats, SlotState};
use crate::graphics_device::{
    AcquireResult, Extent2D, FenceStatus, GraphicsDevice, PipelineStages, PresentResult,
    SampleCount, SubmitInfo, Swapchain,
};
use crate::picking::ObjectPicker;
use crate::render_graph::{BloomGraph, FrameContext};
use crate::resource::{PipelineCacheStore, ShaderProvider};
use crate::scene::{EntityKey, Scene, SceneRegistry};

/// What one call to [`FrameOrchestrator::render_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing was submitted (zero-area surface, out-of-date swapchain,
    /// or a dropped frame)
    Skipped,
}

// Fields drop in declaration order: everything referencing GPU objects
// goes before the swapchain, the swapchain before the device.
pub struct FrameOrchestrator {
    scene: Scene,
    picker: ObjectPicker,
    slots: Vec<FrameSlot>,
    graph: BloomGraph,
    swapchain: Box<dyn Swapchain>,
    cache_store: PipelineCacheStore,
    stats: FrameStats,
    config: RendererConfig,
    samples: SampleCount,
    frame_slot: usize,
    frame_number: u64,
    /// Image acquired by `begin_frame` and not yet presented
    image_index: Option<u32>,
    /// Latest size reported by the window
    pending_resize: Option<Extent2D>,
    needs_invalidate: bool,
    shut_down: bool,
    device: Arc<dyn GraphicsDevice>,
}

impl FrameOrchestrator {
    /// Build the render graph, picker, frame slots and an empty scene.
    ///
    /// `cache_store` receives the device's pipeline cache at shutdown.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        swapchain: Box<dyn Swapchain>,
        shaders: &dyn ShaderProvider,
        config: RendererConfig,
        cache_store: PipelineCacheStore,
    ) -> Result<Self> {
        config.validate()?;
        let samples = supported_samples(device.as_ref(), config.msaa_samples);

        let graph = BloomGraph::new(device.clone(), shaders, &config, samples, swapchain.as_ref())?;
        let picker = ObjectPicker::new(device.clone(), shaders, swapchain.extent(), config.fence_timeout_ns())?;
        let slots = (0..config.frames_in_flight)
            .map(|_| FrameSlot::new(device.as_ref(), &graph))
            .collect::<Result<Vec<_>>>()?;
        let registry = SceneRegistry::new(
            device.clone(),
            graph.pipelines().material_pipeline().clone(),
            config.frames_in_flight,
        )?;

        let extent = swapchain.extent();
        crate::engine_info!("solar3d::frame",
            "Frame orchestrator ready: {} frames in flight, {} swap images, {}x{}, {}x MSAA",
            slots.len(), swapchain.image_count(), extent.width, extent.height, samples.count());

        Ok(Self {
            scene: Scene::new(registry),
            picker,
            slots,
            graph,
            swapchain,
            cache_store,
            stats: FrameStats::default(),
            config,
            samples,
            frame_slot: 0,
            frame_number: 0,
            image_index: None,
            pending_resize: None,
            needs_invalidate: false,
            shut_down: false,
            device,
        })
    }

    // ===== ACCESSORS =====

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn graph(&self) -> &BloomGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut BloomGraph {
        &mut self.graph
    }

    pub fn picker(&self) -> &ObjectPicker {
        &self.picker
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// MSAA sample count actually in use (the configured one, capped by the device)
    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next frame will use
    pub fn frame_slot(&self) -> usize {
        self.frame_slot
    }

    /// Number of frames submitted so far
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.slots.get(slot).map(FrameSlot::state)
    }

    pub fn swapchain_extent(&self) -> Extent2D {
        self.swapchain.extent()
    }

    /// True when the next frame will rebuild the swapchain first
    pub fn needs_invalidate(&self) -> bool {
        self.needs_invalidate
    }

    // ===== FRAME LOOP =====

    /// One full iteration of the loop, applying the error policy
    pub fn render_frame(&mut self) -> Result<FrameOutcome> {
        match self.try_render_frame() {
            Ok(FrameOutcome::Skipped) => {
                self.stats.record_skipped();
                Ok(FrameOutcome::Skipped)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_fatal() => {
                crate::engine_error!("solar3d::frame", "Frame {} failed: {}", self.frame_number, e);
                Err(e)
            }
            Err(e) => {
                crate::engine_warn!("solar3d::frame", "Dropped frame {}: {}", self.frame_number, e);
                self.recover_dropped_frame()?;
                self.stats.record_skipped();
                Ok(FrameOutcome::Skipped)
            }
        }
    }

    fn try_render_frame(&mut self) -> Result<FrameOutcome> {
        if self.begin_frame()?.is_none() {
            return Ok(FrameOutcome::Skipped);
        }
        let time = self.scene.clock.time();
        self.update_scene(time)?;
        self.record_frame()?;
        self.submit_and_present()
    }

    /// Wait for the current slot to be free and acquire a swapchain image.
    ///
    /// Returns the acquired image index, or None when nothing should be
    /// drawn this iteration (zero-area surface, out-of-date swapchain).
    pub fn begin_frame(&mut self) -> Result<Option<u32>> {
        if self.needs_invalidate {
            self.invalidate()?;
        }
        if self.needs_invalidate || self.graph.targets().is_none() {
            return Ok(None);
        }

        let timeout_ns = self.config.fence_timeout_ns();
        let slot = &mut self.slots[self.frame_slot];
        if slot.in_flight.wait(timeout_ns)? == FenceStatus::TimedOut {
            crate::engine_bail!(DeviceLost, "solar3d::frame",
                "Frame slot {} fence not signaled after {:?}", self.frame_slot, self.config.fence_timeout);
        }
        slot.state = SlotState::Idle;
        self.scene.registry.advance_frame(self.frame_number);

        slot.state = SlotState::Acquiring;
        let image_index = match self.swapchain.acquire_next_image(slot.image_acquired.as_ref())? {
            AcquireResult::Image(index) => index,
            AcquireResult::Suboptimal(index) => {
                crate::engine_debug!("solar3d::frame", "Suboptimal swapchain on acquire");
                self.needs_invalidate = true;
                index
            }
            AcquireResult::OutOfDate => {
                slot.state = SlotState::Idle;
                crate::engine_debug!("solar3d::frame", "Swapchain out of date on acquire");
                self.needs_invalidate = true;
                self.invalidate()?;
                return Ok(None);
            }
        };
        slot.state = SlotState::Recording;
        self.image_index = Some(image_index);
        Ok(Some(image_index))
    }

    /// Recompute transforms for simulated time `time` and write the frame
    /// uniforms of the current slot. Idempotent for a given `time`.
    pub fn update_scene(&mut self, time: f64) -> Result<()> {
        self.scene.update(time);
        let uniforms = self.scene.frame_uniforms(self.swapchain.extent().aspect_ratio());
        self.slots[self.frame_slot].uniforms.update(0, bytemuck::bytes_of(&uniforms))
    }

    /// Record the five passes into the current slot's command list
    pub fn record_frame(&mut self) -> Result<()> {
        let Some(image_index) = self.image_index else {
            crate::engine_bail!("solar3d::frame", "record_frame without an acquired image");
        };
        let slot = &mut self.slots[self.frame_slot];
        slot.commands.begin()?;
        let frame = FrameContext {
            frame_number: self.frame_number,
            image_index,
            frame_bindings: &slot.frame_bindings,
            scene: &self.scene,
        };
        self.graph.record_frame(slot.commands.as_mut(), &frame)?;
        slot.commands.end()
    }

    /// Submit the current slot, present its image and advance to the next slot
    pub fn submit_and_present(&mut self) -> Result<FrameOutcome> {
        let Some(image_index) = self.image_index.take() else {
            crate::engine_bail!("solar3d::frame", "submit_and_present without an acquired image");
        };
        let slot = &mut self.slots[self.frame_slot];
        slot.in_flight.reset()?;
        let submitted = self.device.submit(&SubmitInfo {
            command_lists: &[&*slot.commands],
            wait_semaphores: &[(slot.image_acquired.as_ref(), PipelineStages::COLOR_ATTACHMENT_OUTPUT)],
            signal_semaphores: &[slot.render_complete.as_ref()],
            fence: Some(slot.in_flight.as_ref()),
        });
        if let Err(e) = submitted {
            // Nothing will signal the reset fence now
            slot.in_flight = self.device.create_fence(true)?;
            slot.state = SlotState::Idle;
            return Err(e);
        }
        slot.state = SlotState::Submitted;
        let presented = self.swapchain.present(image_index, slot.render_complete.as_ref());

        self.frame_slot = (self.frame_slot + 1) % self.slots.len();
        self.frame_number += 1;
        self.stats.record_submitted();

        match presented? {
            PresentResult::Optimal => {}
            PresentResult::Suboptimal | PresentResult::OutOfDate => {
                crate::engine_debug!("solar3d::frame", "Swapchain needs rebuilding after present");
                self.needs_invalidate = true;
            }
        }
        if self.needs_invalidate {
            self.invalidate()?;
        }
        Ok(FrameOutcome::Presented)
    }

    /// Rebuild every extent-dependent object for the current surface size.
    ///
    /// Waits for the device to go idle first. A zero-area surface defers the
    /// rebuild; frames are skipped until a usable size arrives.
    pub fn invalidate(&mut self) -> Result<()> {
        self.needs_invalidate = true;
        let extent = self.pending_resize.unwrap_or_else(|| self.swapchain.extent());
        if extent.is_zero_area() {
            crate::engine_trace!("solar3d::frame", "Zero-area surface, rebuild deferred");
            return Ok(());
        }

        self.device.wait_idle()?;
        self.scene.registry.release_all_retired();
        self.graph.release_targets();
        self.picker.release_target();

        match self.swapchain.recreate(extent.width, extent.height) {
            Ok(()) => {}
            Err(Error::SurfaceOutOfDate) => {
                crate::engine_warn!("solar3d::frame",
                    "Surface out of date while recreating the swapchain, retrying next frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let actual = self.swapchain.extent();
        self.graph.rebuild_targets(self.swapchain.as_ref())?;
        self.picker.resize(actual)?;

        self.pending_resize = None;
        self.needs_invalidate = false;
        self.stats.record_invalidation();
        crate::engine_info!("solar3d::frame", "Rebuilt render targets at {}x{}", actual.width, actual.height);
        Ok(())
    }

    /// Drop whatever the failed frame left behind so the next one starts clean
    fn recover_dropped_frame(&mut self) -> Result<()> {
        self.image_index = None;
        self.device.wait_idle()?;
        // A half-finished frame can leave an unconsumed signal on either semaphore
        for slot in &mut self.slots {
            slot.reset_semaphores(self.device.as_ref())?;
            slot.state = SlotState::Idle;
        }
        self.needs_invalidate = true;
        Ok(())
    }

    // ===== WINDOW & INPUT =====

    /// Record the window's new size; the rebuild happens at the next frame
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        crate::engine_debug!("solar3d::frame", "Resize to {}x{}", width, height);
        self.pending_resize = Some(Extent2D::new(width, height));
        self.needs_invalidate = true;
    }

    /// Select the entity under pixel (`x`, `y`). Background clicks select nothing
    /// and keep the current selection.
    pub fn pick(&mut self, x: f64, y: f64) -> Result<Option<EntityKey>> {
        let object_id = self.picker.pick(&self.scene, x, y)?;
        Ok(self.scene.select_picked(object_id))
    }

    // ===== SHUTDOWN =====

    /// Wait for the GPU and save the pipeline cache. Called once; dropping
    /// the orchestrator afterwards releases everything in reverse order.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.device.wait_idle()?;
        self.scene.registry.release_all_retired();

        match self.device.pipeline_cache_data() {
            Ok(data) => {
                if let Err(e) = self.cache_store.save(&data) {
                    crate::engine_warn!("solar3d::frame", "Pipeline cache not saved: {}", e);
                }
            }
            Err(e) => crate::engine_warn!("solar3d::frame", "Pipeline cache unavailable: {}", e),
        }
        crate::engine_info!("solar3d::frame",
            "Shut down after {} frames ({} skipped, {} invalidations)",
            self.stats.frames_submitted, self.stats.frames_skipped, self.stats.invalidations);
        Ok(())
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(e) = self.device.wait_idle() {
                crate::engine_error!("solar3d::frame", "wait_idle failed during teardown: {}", e);
            }
        }
    }
}

/// Configured MSAA count, capped to what the device supports
fn supported_samples(device: &dyn GraphicsDevice, requested: u32) -> SampleCount {
    let requested = SampleCount::from_count(requested).unwrap_or(SampleCount::S1);
    let max = device.limits().max_msaa_samples;
    if requested > max {
        crate::engine_warn!("solar3d::frame",
            "{}x MSAA not supported, using {}x", requested.count(), max.count());
        return max;
    }
    requested
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
