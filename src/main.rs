use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use glam::Vec2;

mod field;
mod lighting;
mod params;
mod pipeline;
mod renderer;
mod scene;
mod snapshot;
mod ui;

use field::ChladniService;
use lighting::LightingRig;
use pipeline::Viewer;
use renderer::{GpuState, OrbitCamera};
use snapshot::{SNAPSHOT_FILENAME, Snapshot};
use ui::{UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    camera: OrbitCamera,
    viewer: Viewer,
    lighting: LightingRig,
    ui_state: UiState,

    orbiting: bool,
    mouse_delta: Vec2,

    lighting_dirty: bool,
    last_vsync_state: bool,
}

impl App {
    fn new() -> Self {
        let camera = OrbitCamera::default();
        let viewer = Viewer::new(ChladniService, camera.fov);
        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            camera,
            viewer,
            lighting: LightingRig::default(),
            ui_state: UiState::default(),

            orbiting: false,
            mouse_delta: Vec2::ZERO,

            lighting_dirty: true,
            last_vsync_state: true,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) {
        let gpu = pollster::block_on(GpuState::new(window.clone()));

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        let size = window.inner_size();
        self.camera
            .set_aspect(size.width as f32, size.height as f32);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);

        self.viewer.initial_fetch(self.ui_state.params);
    }

    fn update(&mut self) {
        self.viewer.tick(Instant::now());

        if let Some(frame) = self.viewer.take_camera_frame() {
            self.camera.apply_frame(frame);
        }

        if self.orbiting {
            self.camera.process_mouse_movement(self.mouse_delta);
        }
        self.mouse_delta = Vec2::ZERO;
        self.camera.update();
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);

        let mut ui_actions = UiActions::default();
        let status = self.viewer.status().cloned();
        let fetch_error = self.viewer.fetch_error();
        let is_fetching = self.viewer.is_fetching();
        let show_help = self.ui_state.show_help;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(
                ctx,
                &mut self.ui_state,
                &mut self.lighting,
                status.as_ref(),
                &fetch_error,
                is_fetching,
            );
            if show_help {
                draw_help_overlay(ctx);
            }
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if self.ui_state.vsync_enabled != self.last_vsync_state {
            gpu.set_vsync(self.ui_state.vsync_enabled);
            self.last_vsync_state = self.ui_state.vsync_enabled;
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("Out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.update_camera(&self.camera);
        if self.lighting_dirty {
            gpu.update_lighting(&self.lighting);
            self.lighting_dirty = false;
        }
        gpu.background = self.ui_state.background;
        gpu.sync_scene(&self.viewer.scene);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_scene(&view, &mut encoder);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.params_changed {
            self.viewer.params_changed(self.ui_state.params, Instant::now());
        }

        if let Some(mode) = actions.render_mode {
            self.viewer.set_render_mode(mode);
        }
        if let Some(kind) = actions.material_kind {
            self.viewer.set_material_kind(kind);
        }
        if let Some(color) = actions.front_color {
            self.viewer.set_front_color(color);
        }
        if let Some(color) = actions.back_color {
            self.viewer.set_back_color(color);
        }
        if actions.lighting_changed {
            self.lighting_dirty = true;
        }
        if actions.acknowledge_status {
            self.viewer.acknowledge_status();
        }

        if actions.export_snapshot {
            self.export_snapshot();
        }
        if actions.import_snapshot {
            self.import_snapshot();
        }
    }

    fn export_snapshot(&mut self) {
        let snapshot = match self.viewer.export_snapshot(self.ui_state.params) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("export refused: {e}");
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(SNAPSHOT_FILENAME)
            .save_file()
        else {
            return;
        };
        if let Err(e) = snapshot.write_to(&path) {
            log::error!("failed to write {}: {e}", path.display());
        } else {
            log::info!("pattern exported to {}", path.display());
        }
    }

    fn import_snapshot(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match Snapshot::read_from(&path) {
            Ok(snapshot) => {
                self.ui_state.params = self.viewer.import_snapshot(snapshot);
                // Imports come back under the default single-sided look.
                self.ui_state.render_mode = self.viewer.materials.mode();
                self.ui_state.material = *self.viewer.materials.config();
                log::info!("pattern imported from {}", path.display());
            }
            Err(e) => {
                log::error!("failed to import {}: {e}", path.display());
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title("Chladni 3D")
            .with_inner_size(PhysicalSize::new(1440, 900));

        let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
        self.init_gpu(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.viewer.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera
                        .set_aspect(size.width as f32, size.height as f32);
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.orbiting = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.process_scroll(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.orbiting {
                self.mouse_delta.x += delta.0 as f32;
                self.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).unwrap();
}
