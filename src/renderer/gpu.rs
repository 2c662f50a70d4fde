use std::sync::Arc;

use crate::lighting::{Light, LightingRig};
use crate::renderer::camera::{CameraUniform, OrbitCamera};
use crate::scene::{MaterialKind, Scene, Side, SurfaceMesh};

const MAX_MESH_VERTICES: usize = 1_000_000;
const MAX_MESH_INDICES: usize = 3_000_000;

/// At most two entities are ever live (front + back in double mode).
const ENTITY_SLOTS: usize = 2;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub directional_dir: [f32; 3],
    pub ambient: f32,
    pub directional: f32,
    pub hemisphere: f32,
    pub camera_point: f32,
    pub _pad: f32,
}

impl LightingUniform {
    /// Absent lights contribute zero intensity; the shader needs no
    /// per-kind presence flags.
    pub fn from_rig(rig: &LightingRig) -> Self {
        let mut uniform = Self {
            directional_dir: [1.0, 1.0, 1.0],
            ambient: 0.0,
            directional: 0.0,
            hemisphere: 0.0,
            camera_point: 0.0,
            _pad: 0.0,
        };
        for light in rig.lights() {
            match *light {
                Light::Ambient { intensity } => uniform.ambient = intensity,
                Light::Directional {
                    direction,
                    intensity,
                } => {
                    uniform.directional_dir = direction.to_array();
                    uniform.directional = intensity;
                }
                Light::Hemisphere { intensity } => uniform.hemisphere = intensity,
                Light::CameraPoint { intensity } => uniform.camera_point = intensity,
            }
        }
        uniform
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct EntityUniform {
    color: [f32; 3],
    shading: u32,
    offset: [f32; 3],
    _pad: f32,
}

fn shading_id(kind: MaterialKind) -> u32 {
    match kind {
        MaterialKind::Physical => 0,
        MaterialKind::Standard => 1,
        MaterialKind::Toon => 2,
        MaterialKind::NormalViz => 3,
    }
}

/// GPU residence of one scene entity. The kept `Arc` makes pointer
/// equality a sound skip-upload check for shared geometry.
struct MeshSlot {
    vertex_buffer: wgpu::Buffer,
    normal_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    geometry: Option<Arc<SurfaceMesh>>,
    side: Side,
}

impl MeshSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, index: usize) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Vertex Buffer"),
            size: (MAX_MESH_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let normal_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Normal Buffer"),
            size: (MAX_MESH_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Index Buffer"),
            size: (MAX_MESH_INDICES * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Entity Uniform Buffer {index}")),
            size: std::mem::size_of::<EntityUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Entity Bind Group {index}")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            normal_buffer,
            index_buffer,
            index_count: 0,
            uniform_buffer,
            bind_group,
            geometry: None,
            side: Side::Double,
        }
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pipeline_double: wgpu::RenderPipeline,
    pipeline_front: wgpu::RenderPipeline,
    pipeline_back: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    shared_bind_group: wgpu::BindGroup,

    slots: [MeshSlot; ENTITY_SLOTS],
    live_slots: usize,
    last_scene_epoch: Option<u64>,

    pub background: [f32; 3],

    depth_texture: wgpu::TextureView,
}

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

impl GpuState {
    pub async fn new(window: std::sync::Arc<winit::window::Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .unwrap();

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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting Buffer"),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shared_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shared Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let shared_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shared Bind Group"),
            layout: &shared_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        });

        let entity_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Entity Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&shared_layout, &entity_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |cull: Option<wgpu::Face>, label: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_mesh"),
                    buffers: &[position_layout(), normal_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_mesh"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: cull,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let pipeline_double = make_pipeline(None, "Mesh Pipeline (double sided)");
        let pipeline_front = make_pipeline(Some(wgpu::Face::Back), "Mesh Pipeline (front faces)");
        let pipeline_back = make_pipeline(Some(wgpu::Face::Front), "Mesh Pipeline (back faces)");

        let slots = std::array::from_fn(|i| MeshSlot::new(&device, &entity_layout, i));
        let depth_texture = Self::create_depth_texture(&device, &config);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_double,
            pipeline_front,
            pipeline_back,
            camera_buffer,
            lighting_buffer,
            shared_bind_group,
            slots,
            live_slots: 0,
            last_scene_epoch: None,
            background: [1.0, 1.0, 1.0],
            depth_texture,
        }
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = if enabled {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }

    pub fn update_camera(&self, camera: &OrbitCamera) {
        let uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn update_lighting(&self, rig: &LightingRig) {
        let uniform = LightingUniform::from_rig(rig);
        self.queue
            .write_buffer(&self.lighting_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Mirrors the scene into GPU buffers. Geometry uploads are skipped
    /// for slots already holding the same `Arc`; entity uniforms (color,
    /// shading, offset) are rewritten on every epoch change so color
    /// edits stay cheap.
    pub fn sync_scene(&mut self, scene: &Scene) {
        if self.last_scene_epoch == Some(scene.epoch()) {
            return;
        }
        self.last_scene_epoch = Some(scene.epoch());

        let entities = scene.entities();
        self.live_slots = entities.len().min(ENTITY_SLOTS);

        for (slot, entity) in self.slots.iter_mut().zip(entities) {
            let resident = slot
                .geometry
                .as_ref()
                .is_some_and(|g| Arc::ptr_eq(g, &entity.geometry));
            if !resident {
                let mesh = &entity.geometry;
                let vertex_floats = mesh.positions.len().min(MAX_MESH_VERTICES * 3);
                let index_count = mesh.indices.len().min(MAX_MESH_INDICES);
                if vertex_floats < mesh.positions.len() || index_count < mesh.indices.len() {
                    log::warn!(
                        "mesh exceeds slot capacity, truncating: {} vertices (cap {}), {} indices (cap {})",
                        mesh.vertex_count(),
                        MAX_MESH_VERTICES,
                        mesh.indices.len(),
                        MAX_MESH_INDICES
                    );
                }
                self.queue.write_buffer(
                    &slot.vertex_buffer,
                    0,
                    bytemuck::cast_slice(&mesh.positions[..vertex_floats]),
                );
                self.queue.write_buffer(
                    &slot.normal_buffer,
                    0,
                    bytemuck::cast_slice(&mesh.normals[..vertex_floats]),
                );
                self.queue.write_buffer(
                    &slot.index_buffer,
                    0,
                    bytemuck::cast_slice(&mesh.indices[..index_count]),
                );
                slot.index_count = index_count as u32;
                slot.geometry = Some(Arc::clone(&entity.geometry));
            }

            slot.side = entity.material.side;
            let uniform = EntityUniform {
                color: entity.material.color,
                shading: shading_id(entity.material.kind),
                offset: entity.offset.to_array(),
                _pad: 0.0,
            };
            self.queue
                .write_buffer(&slot.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }

    pub fn render_scene(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let [r, g, b] = self.background.map(f64::from);
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.shared_bind_group, &[]);

        for slot in self.slots.iter().take(self.live_slots) {
            if slot.index_count == 0 {
                continue;
            }
            let pipeline = match slot.side {
                Side::Double => &self.pipeline_double,
                Side::Front => &self.pipeline_front,
                Side::Back => &self.pipeline_back,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &slot.bind_group, &[]);
            render_pass.set_vertex_buffer(0, slot.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, slot.normal_buffer.slice(..));
            render_pass.set_index_buffer(slot.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..slot.index_count, 0, 0..1);
        }
    }
}
