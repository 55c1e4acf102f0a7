//! Solar3D demo - a small solar system rendered through the bloom graph.
//!
//! Controls: left click selects a body (the camera follows it), right drag
//! orbits the camera, the wheel zooms, Space pauses, +/- change the time
//! scale, Escape quits. `SOLAR_LOG=trace|debug|info|warn|error` sets the
//! log threshold.

mod assets;
mod solar_system;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};
use solar_engine::solar3d::{Engine, Error, RendererConfig, Result};
use solar_engine::solar3d::frame::FrameOrchestrator;
use solar_engine::solar3d::log::LogSeverity;
use solar_engine::solar3d::render::GraphicsDevice;
use solar_engine::solar3d::resource::{FileShaderProvider, PipelineCacheStore};
use solar_engine::{engine_error, engine_info, engine_warn};
use solar_engine_renderer_vulkan::{get_validation_stats, print_validation_stats_report, VulkanGraphicsDevice};

use crate::assets::DemoAssets;

/// Radians of camera rotation per pixel of right-drag
const ORBIT_SPEED: f32 = 0.005;

struct App {
    config: RendererConfig,
    data_root: PathBuf,
    // Dropped before the window: the swapchain owns the window's surface
    orchestrator: Option<FrameOrchestrator>,
    window: Option<Window>,
    cursor: PhysicalPosition<f64>,
    dragging: Option<PhysicalPosition<f64>>,
    last_tick: Option<Instant>,
    failure: Option<Error>,
}

impl App {
    fn new(config: RendererConfig, data_root: PathBuf) -> Self {
        Self {
            config,
            data_root,
            orchestrator: None,
            window: None,
            cursor: PhysicalPosition::new(0.0, 0.0),
            dragging: None,
            last_tick: None,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.app_name.as_str())
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = event_loop.create_window(attributes).map_err(|e| {
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;

        let device: Arc<dyn GraphicsDevice> = Arc::new(VulkanGraphicsDevice::new(&window, &self.config)?);
        let swapchain = device.create_swapchain(&window)?;
        let shaders = FileShaderProvider::new(self.data_root.join("shaders"));
        let cache_store = PipelineCacheStore::new(self.config.pipeline_cache_path.clone());

        let mut orchestrator = FrameOrchestrator::new(device, swapchain, &shaders, self.config.clone(), cache_store)?;
        solar_system::build(&mut orchestrator, &DemoAssets::new(self.data_root.join("assets")))?;

        self.orchestrator = Some(orchestrator);
        self.window = Some(window);
        Ok(())
    }

    /// Record a fatal error and leave the event loop
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        engine_error!("solar_demo", "Unrecoverable error: {}", error);
        self.failure = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return Ok(());
        };
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            orchestrator.scene_mut().clock.advance(now - last);
        }
        orchestrator.render_frame()?;
        Ok(())
    }

    fn pick(&mut self) -> Result<()> {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return Ok(());
        };
        match orchestrator.pick(self.cursor.x, self.cursor.y) {
            Ok(Some(key)) => {
                let name = orchestrator
                    .scene()
                    .registry
                    .get(key)
                    .and_then(|entity| entity.body())
                    .map(|body| body.name.clone())
                    .unwrap_or_default();
                engine_info!("solar_demo", "Selected '{}'", name);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                engine_warn!("solar_demo", "Pick failed: {}", e);
                Ok(())
            }
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        if let Key::Named(NamedKey::Escape) = key {
            event_loop.exit();
            return;
        }
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return;
        };
        let clock = &mut orchestrator.scene_mut().clock;
        match key {
            Key::Named(NamedKey::Space) => clock.toggle_pause(),
            Key::Character(c) if c.as_str() == "+" || c.as_str() == "=" => clock.set_scale(clock.scale() * 2.0),
            Key::Character(c) if c.as_str() == "-" => clock.set_scale(clock.scale() * 0.5),
            _ => return,
        }
        engine_info!("solar_demo", "Time scale {}x{}", clock.scale(), if clock.is_paused() { " (paused)" } else { "" });
    }

    fn shutdown(&mut self) {
        if let Some(orchestrator) = self.orchestrator.as_mut() {
            if let Err(e) = orchestrator.shutdown() {
                engine_error!("solar_demo", "Shutdown failed: {}", e);
            }
        }
        self.orchestrator = None;
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                engine_info!("solar_demo", "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(orchestrator) = self.orchestrator.as_mut() {
                    orchestrator.notify_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (Some(origin), Some(orchestrator)) = (self.dragging, self.orchestrator.as_mut()) {
                    let dx = (position.x - origin.x) as f32;
                    let dy = (position.y - origin.y) as f32;
                    orchestrator.scene_mut().camera.orbit(-dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                    self.dragging = Some(position);
                }
                self.cursor = position;
            }
            WindowEvent::MouseInput { state, button, .. } => match (button, state) {
                (MouseButton::Left, ElementState::Pressed) => {
                    if let Err(e) = self.pick() {
                        self.fail(event_loop, e);
                    }
                }
                (MouseButton::Right, ElementState::Pressed) => self.dragging = Some(self.cursor),
                (MouseButton::Right, ElementState::Released) => self.dragging = None,
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                if let Some(orchestrator) = self.orchestrator.as_mut() {
                    orchestrator.scene_mut().camera.zoom(0.9f32.powf(lines));
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.on_key(event_loop, &event.logical_key);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn configure_logging() {
    match std::env::var("SOLAR_LOG") {
        Ok(value) => match LogSeverity::parse(&value) {
            Some(severity) => Engine::set_min_severity(severity),
            None => engine_warn!("solar_demo", "Ignoring unknown SOLAR_LOG value '{}'", value),
        },
        Err(_) => Engine::set_min_severity(LogSeverity::Info),
    }
}

fn main() -> ExitCode {
    configure_logging();

    let data_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let config = RendererConfig::default()
        .with_app_name("Solar System")
        .with_pipeline_cache_path(data_root.join("target").join("pipeline_cache.bin"));

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("solar_demo", "Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, data_root);
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!("solar_demo", "Event loop error: {}", e);
        return ExitCode::FAILURE;
    }
    app.shutdown();

    if get_validation_stats().total() > 0 {
        print_validation_stats_report();
    }

    match app.failure {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
