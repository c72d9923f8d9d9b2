use anyhow::{Context as _, Result};
use clap::Parser;
use debugviz_common::{Camera, Color, Transform};
use debugviz_geometry::Mesh;
use debugviz_render::{
    FilledGridOverlay, Frame, NormalOverlay, Overlay, RenderContext, RenderResult, SceneConfig,
    WireGridOverlay, render_all,
};
use debugviz_render_wgpu::{OrbitCamera, WgpuContext};
use debugviz_tools::{Folder, Inspectable, PanelLayout, Property, PropertyValue};
use egui::Context as EguiContext;
use glam::{Quat, Vec3};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.1,
    a: 1.0,
};

#[derive(Parser)]
#[command(name = "debugviz-desktop", about = "Debug overlay demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (JSON); missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_scene(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scene: SceneConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    scene.validate()?;
    Ok(scene)
}

/// Application state that lives outside the GPU.
struct AppState {
    scene: SceneConfig,
    camera: OrbitCamera,
    target: Mesh,
    spin: bool,
    spin_speed: f32,
    angle: f32,
    dragging: bool,
    show_inspector: bool,
    last_frame: Instant,
    last_draws: u32,
}

impl AppState {
    fn new(scene: SceneConfig) -> Result<Self> {
        let size = scene.target_size;
        let target = Mesh::cube(size)?
            .with_name("target")
            .with_transform(Transform::default().with_position(Vec3::new(0.0, size, 0.0)));
        Ok(Self {
            scene,
            camera: OrbitCamera::default(),
            target,
            spin: true,
            spin_speed: 0.6,
            angle: 0.0,
            dragging: false,
            show_inspector: true,
            last_frame: Instant::now(),
            last_draws: 0,
        })
    }

    fn update(&mut self, dt: f32) {
        if self.spin {
            self.angle = (self.angle + self.spin_speed * dt) % std::f32::consts::TAU;
            self.target.transform.rotation =
                Quat::from_rotation_y(self.angle) * Quat::from_rotation_x(self.angle * 0.5);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => self.show_inspector = !self.show_inspector,
            KeyCode::Space => self.spin = !self.spin,
            KeyCode::KeyR => {
                let aspect = self.camera.aspect;
                self.camera = OrbitCamera {
                    aspect,
                    ..OrbitCamera::default()
                };
            }
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, overlays: &mut Overlays, pipelines: usize) {
        if !self.show_inspector {
            return;
        }

        egui::SidePanel::left("inspector")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("debugviz");
                ui.separator();
                ui.label(format!("Draw calls: {}", self.last_draws));
                ui.label(format!("Pipelines: {pipelines}"));
                ui.label(format!(
                    "Camera: distance {:.0}, yaw {:.0}°, pitch {:.0}°",
                    self.camera.distance,
                    self.camera.yaw.to_degrees(),
                    self.camera.pitch.to_degrees()
                ));
                ui.checkbox(&mut self.spin, "Spin target (Space)");
                ui.add(egui::Slider::new(&mut self.spin_speed, 0.0..=3.0).text("speed"));
                ui.separator();

                ui.collapsing(overlays.wire.name().to_string(), |ui| {
                    inspector_ui(ui, overlays.wire_layout.root(), &overlays.wire_layout, &mut overlays.wire);
                    if let Some(c) = color_edit(ui, "color", overlays.wire.color()) {
                        overlays.wire.set_color(c);
                    }
                });
                ui.collapsing(overlays.filled.name().to_string(), |ui| {
                    inspector_ui(
                        ui,
                        overlays.filled_layout.root(),
                        &overlays.filled_layout,
                        &mut overlays.filled,
                    );
                    if let Some(c) = color_edit(ui, "fill", overlays.filled.fill_color()) {
                        overlays.filled.set_fill_color(c);
                    }
                    if let Some(c) = color_edit(ui, "lines", overlays.filled.line_color()) {
                        overlays.filled.set_line_color(c);
                    }
                });
                ui.collapsing("normals", |ui| {
                    inspector_ui(
                        ui,
                        overlays.normals_layout.root(),
                        &overlays.normals_layout,
                        &mut overlays.normals,
                    );
                    if let Some(c) = color_edit(ui, "line", overlays.normals.line_color()) {
                        overlays.normals.set_line_color(c);
                    }
                    ui.label(format!(
                        "{} points, {} line indices",
                        overlays.normals.point_count(),
                        overlays.normals.line_index_count()
                    ));
                });

                ui.separator();
                ui.small("F1: Toggle Inspector | LMB: Orbit | Wheel: Zoom | R: Reset");
            });
    }
}

/// Widgets for every binding under `folder`, written back through `layout`.
fn inspector_ui(
    ui: &mut egui::Ui,
    folder: &Folder,
    layout: &PanelLayout,
    target: &mut dyn Inspectable,
) {
    for property in &folder.properties {
        let path = property.path();
        let result = match property {
            Property::Toggle { .. } => {
                let mut on = target
                    .property(path)
                    .and_then(PropertyValue::as_bool)
                    .unwrap_or(false);
                if ui.checkbox(&mut on, property.label()).changed() {
                    layout.apply(target, path, PropertyValue::Bool(on))
                } else {
                    Ok(())
                }
            }
            Property::Range { min, max, .. } => {
                let mut value = target
                    .property(path)
                    .and_then(PropertyValue::as_float)
                    .unwrap_or(0.0);
                let slider = egui::Slider::new(&mut value, *min..=*max).text(property.label());
                if ui.add(slider).changed() {
                    layout.apply(target, path, PropertyValue::Float(value))
                } else {
                    Ok(())
                }
            }
        };
        if let Err(e) = result {
            tracing::warn!(path, "inspector write rejected: {e}");
        }
    }
    for sub in &folder.folders {
        ui.collapsing(sub.name.as_str(), |ui| inspector_ui(ui, sub, layout, target));
    }
}

fn color_edit(ui: &mut egui::Ui, label: &str, color: Color) -> Option<Color> {
    let mut rgb = color.to_array();
    let changed = ui
        .horizontal(|ui| {
            ui.label(label);
            ui.color_edit_button_rgb(&mut rgb).changed()
        })
        .inner;
    if changed {
        Color::from_triple(rgb).ok()
    } else {
        None
    }
}

/// The scene's overlays plus the inspector layout each one registered.
struct Overlays {
    wire: WireGridOverlay,
    filled: FilledGridOverlay,
    normals: NormalOverlay,
    wire_layout: PanelLayout,
    filled_layout: PanelLayout,
    normals_layout: PanelLayout,
}

impl Overlays {
    fn new(ctx: &mut dyn RenderContext, scene: &SceneConfig, target: &Mesh) -> RenderResult<Self> {
        let wire = WireGridOverlay::new(ctx, &scene.wire_grid)?;
        let filled = FilledGridOverlay::new(ctx, &scene.filled_grid)?;
        let normals = NormalOverlay::new(ctx, target, &scene.normals)?;

        let mut wire_layout = PanelLayout::new();
        wire.add_gui(&mut wire_layout);
        let mut filled_layout = PanelLayout::new();
        filled.add_gui(&mut filled_layout);
        let mut normals_layout = PanelLayout::new();
        normals.add_gui(&mut normals_layout);

        Ok(Self {
            wire,
            filled,
            normals,
            wire_layout,
            filled_layout,
            normals_layout,
        })
    }

    fn render(
        &mut self,
        ctx: &mut WgpuContext,
        camera: &dyn Camera,
        target: &Mesh,
    ) -> RenderResult<u32> {
        let mut frame = Frame::new(ctx);
        let mut normals = self.normals.with_target(target);
        let mut overlays: [&mut dyn Overlay; 3] = [&mut self.filled, &mut self.wire, &mut normals];
        render_all(&mut frame, camera, &mut overlays)
    }

    fn release(self, ctx: &mut dyn RenderContext) {
        self.wire.release(ctx);
        self.filled.release(ctx);
        self.normals.release(ctx);
    }
}

/// Everything created once a window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    ctx: WgpuContext,
    overlays: Overlays,
    egui_ctx: EguiContext,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("debugviz")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("debugviz_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        state.camera.set_aspect(config.width, config.height);

        let depth_view = WgpuContext::create_depth_view(&device, config.width, config.height);
        let mut ctx = WgpuContext::new(device.clone(), queue.clone(), surface_format);
        ctx.set_viewport(config.width, config.height);
        let overlays = Overlays::new(&mut ctx, &state.scene, &state.target)?;

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            ctx,
            overlays,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view =
            WgpuContext::create_depth_view(&self.device, self.config.width, self.config.height);
        self.ctx.set_viewport(self.config.width, self.config.height);
    }

    fn render(&mut self, state: &mut AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        match self
            .overlays
            .render(&mut self.ctx, &state.camera, &state.target)
        {
            Ok(draws) => state.last_draws = draws,
            Err(e) => tracing::error!("overlay render failed: {e}"),
        }

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let egui_ctx = self.egui_ctx.clone();
        let pipelines = self.ctx.cached_pipelines();
        let overlays = &mut self.overlays;
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, overlays, pipelines);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        self.ctx
            .flush(&mut encoder, &view, &self.depth_view, Some(CLEAR_COLOR));

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }

    fn shutdown(self) {
        let Gpu {
            mut ctx, overlays, ..
        } = self;
        overlays.release(&mut ctx);
        tracing::debug!("released overlay resources");
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(gpu) = self.gpu.take() {
                    gpu.shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size.width, new_size.height);
                self.state.camera.set_aspect(new_size.width, new_size.height);
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
                self.state.handle_key(key);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);

                gpu.render(&mut self.state);
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.dragging {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = load_scene(cli.config.as_deref())?;
    tracing::info!("debugviz-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp {
        state: AppState::new(scene)?,
        gpu: None,
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}
