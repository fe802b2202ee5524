use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use orbitlight_app::{
    CancelToken, ClockScheduler, FrameOrder, FrameScheduler, SceneApp, SceneConfig, Viewport,
    pivot_angle,
};
use orbitlight_input::{CameraAction, PointerButton, PointerTracker};
use orbitlight_render::Renderer;
use orbitlight_render_wgpu::WgpuRenderer;
use orbitlight_scene::{PerspectiveCamera, SceneGraph};
use orbitlight_tools::inspector::SceneInspector;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "orbitlight-desktop", about = "Orbit light scene in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial window width in physical pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// update-then-draw or draw-then-update
    #[arg(long)]
    frame_order: Option<FrameOrder>,

    /// Do not create the area light helper
    #[arg(long)]
    hide_helper: bool,
}

/// Surface plus wgpu renderer, driven by the app through [`Renderer`].
struct GpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
}

impl Renderer for GpuBackend {
    /// The presented frame, kept open so the overlay can draw on top.
    type Output = Option<(wgpu::SurfaceTexture, wgpu::TextureView)>;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return None;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return None;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer
            .render(&self.device, &self.queue, &view, scene, camera);
        Some((output, view))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct DesktopApp {
    app: SceneApp,
    initial_size: PhysicalSize<u32>,
    clock: ClockScheduler,
    cancel: CancelToken,
    pointer: PointerTracker,
    show_overlay: bool,
    window: Option<Arc<Window>>,
    gpu: Option<GpuBackend>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    init_error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(app: SceneApp, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            app,
            initial_size,
            clock: ClockScheduler::new(),
            cancel: CancelToken::new(),
            pointer: PointerTracker::new(),
            show_overlay: true,
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            init_error: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Orbit Light")
            .with_inner_size(self.initial_size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitlight_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);
        let mut gpu = GpuBackend {
            surface,
            device,
            queue,
            config,
            renderer,
        };
        self.app.resize(&mut gpu, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Escape => self.cancel.cancel(),
            KeyCode::F1 => self.show_overlay = !self.show_overlay,
            KeyCode::KeyR => self.app.apply_camera_action(CameraAction::Reset),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }
        let Some(elapsed_ms) = self.clock.next_frame() else {
            return;
        };
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        if let Some((output, view)) = self.app.frame(gpu, elapsed_ms) {
            self.draw_overlay(&view, elapsed_ms);
            output.present();
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn draw_overlay(&mut self, view: &wgpu::TextureView, elapsed_ms: f64) {
        let (Some(window), Some(gpu), Some(egui_winit), Some(egui_renderer)) = (
            &self.window,
            &self.gpu,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        ) else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let show_overlay = self.show_overlay;
        let app = &mut self.app;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if show_overlay {
                draw_ui(ctx, app, elapsed_ms);
            }
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }
    }
}

fn draw_ui(ctx: &EguiContext, app: &mut SceneApp, elapsed_ms: f64) {
    let summary = SceneInspector::summary(app.scene());

    egui::SidePanel::left("inspector")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("Orbit Light");
            ui.separator();
            ui.label(summary.to_string());
            ui.label(format!("Frame order: {}", app.config().frame_order));
            ui.label(format!("Elapsed: {:.1} s", elapsed_ms * 0.001));
            let angle = pivot_angle(elapsed_ms, app.config().animation.degrees_per_second);
            ui.label(format!(
                "Pivot angle: {:.1} deg",
                angle.to_degrees().rem_euclid(360.0)
            ));
            if let Some(target) = app.light_target() {
                ui.label(format!(
                    "Light target: ({:.2}, {:.2}, {:.2})",
                    target.x, target.y, target.z
                ));
            }
            let eye = app.camera().position;
            ui.label(format!(
                "Camera: ({:.1}, {:.1}, {:.1})  distance {:.1}",
                eye.x,
                eye.y,
                eye.z,
                app.controls().distance()
            ));
            let viewport = app.viewport();
            ui.label(format!(
                "Viewport: {}x{}  aspect {:.3}",
                viewport.width,
                viewport.height,
                viewport.aspect()
            ));
            if ui.button("Reset Camera (R)").clicked() {
                app.apply_camera_action(CameraAction::Reset);
            }

            ui.separator();
            ui.heading("Nodes");
            egui::ScrollArea::vertical().show(ui, |ui| {
                for info in SceneInspector::list_nodes(app.scene()) {
                    ui.monospace(info.to_string());
                }
            });

            ui.separator();
            ui.small("F1: Toggle Overlay | LMB: Orbit | RMB: Pan | Wheel: Zoom | Esc: Quit");
        });
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.init_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.cancel.cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    self.app.resize(gpu, new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.handle_key(key);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button) = pointer_button(button) {
                    self.pointer
                        .button(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(action) = self.pointer.moved(position) {
                    self.app.apply_camera_action(action);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.leave();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                let action = self.pointer.wheel(steps);
                self.app.apply_camera_action(action);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("orbitlight-desktop starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(order) = cli.frame_order {
        config.frame_order = order;
    }
    if cli.hide_helper {
        config.show_helper = false;
    }

    let app = SceneApp::new(config, Viewport::new(cli.width, cli.height))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut desktop = DesktopApp::new(app, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut desktop)?;

    if let Some(e) = desktop.init_error.take() {
        return Err(e);
    }
    tracing::info!(frames = desktop.app.updates(), "orbitlight-desktop exiting");
    Ok(())
}
