use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orbitlight_scene::{
    GeometryHandle, NodeKind, PerspectiveCamera, RectAreaLight, SceneGraph, Side,
};
use wgpu::util::DeviceExt;

const AMBIENT: [f32; 4] = [0.03, 0.03, 0.03, 0.0];
const MAX_INSTANCES: u32 = 1_024;
const MAX_LINE_VERTICES: u32 = 256;
const SAMPLE_COUNT: u32 = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_center: [f32; 4],
    light_right: [f32; 4],
    light_up: [f32; 4],
    light_normal: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Everything one frame uploads, gathered from the scene on the CPU.
#[derive(Debug)]
struct FrameData {
    uniforms: Uniforms,
    /// Instances grouped by geometry, in geometry order.
    batches: Vec<(GeometryHandle, Vec<InstanceData>)>,
    lines: Vec<LineVertex>,
}

impl FrameData {
    fn gather(scene: &SceneGraph, camera: &PerspectiveCamera) -> Self {
        let eye = camera.position;
        let mut uniforms = Uniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, 1.0],
            ambient: AMBIENT,
            ..Uniforms::zeroed()
        };
        let mut batches: Vec<(GeometryHandle, Vec<InstanceData>)> = scene
            .geometries()
            .iter()
            .enumerate()
            .map(|(i, _)| (GeometryHandle(i as u32), Vec::new()))
            .collect();
        let mut lines = Vec::new();
        let mut lit = false;

        for (id, world) in scene.traverse() {
            match &scene.nodes()[&id].kind {
                NodeKind::Mesh(mesh) => {
                    let Some(material) = scene.material(mesh.material) else {
                        continue;
                    };
                    let Some((_, batch)) = batches.get_mut(mesh.geometry.0 as usize) else {
                        continue;
                    };
                    let cols = world.to_cols_array_2d();
                    let [r, g, b] = material.color.to_linear();
                    let double_sided = if material.side == Side::Double { 1.0 } else { 0.0 };
                    batch.push(InstanceData {
                        model_0: cols[0],
                        model_1: cols[1],
                        model_2: cols[2],
                        model_3: cols[3],
                        color: [r, g, b, 1.0],
                        params: [material.roughness, material.metalness, double_sided, 0.0],
                    });
                }
                // Only the first area light is shaded.
                NodeKind::AreaLight(light) if !lit => {
                    write_light(&mut uniforms, light, world);
                    lit = true;
                }
                NodeKind::LightHelper(helper) => {
                    let [r, g, b] = helper.color().to_linear();
                    for (a, b_end) in helper.segments() {
                        lines.push(LineVertex {
                            position: a.to_array(),
                            color: [r, g, b, 1.0],
                        });
                        lines.push(LineVertex {
                            position: b_end.to_array(),
                            color: [r, g, b, 1.0],
                        });
                    }
                }
                _ => {}
            }
        }

        batches.retain(|(_, instances)| !instances.is_empty());
        Self {
            uniforms,
            batches,
            lines,
        }
    }

    fn instance_count(&self) -> usize {
        self.batches.iter().map(|(_, b)| b.len()).sum()
    }
}

fn write_light(uniforms: &mut Uniforms, light: &RectAreaLight, world: Mat4) {
    let center = world.transform_point3(Vec3::ZERO);
    let right = world.transform_vector3(Vec3::X * light.width * 0.5);
    let up = world.transform_vector3(Vec3::Y * light.height * 0.5);
    let normal = world.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
    let [r, g, b] = light.color.to_linear();
    let i = light.intensity;

    uniforms.light_center = [center.x, center.y, center.z, light.area()];
    uniforms.light_right = right.extend(0.0).to_array();
    uniforms.light_up = up.extend(0.0).to_array();
    uniforms.light_normal = normal.extend(0.0).to_array();
    uniforms.light_color = [r * i, g * i, b * i, 1.0];
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu scene renderer: instanced lit meshes plus light helper lines.
///
/// Geometry is uploaded the first time a frame sees it. Registered
/// geometries never change, so uploads are never repeated.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    msaa_view: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    size: (u32, u32),
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        // No culling: single-sided materials discard back faces in the shader.
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil.clone()),
            multisample: multisample_state(),
            multiview: None,
            cache: None,
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample: multisample_state(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: MAX_INSTANCES as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line_buffer"),
            size: MAX_LINE_VERTICES as u64 * std::mem::size_of::<LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);
        let msaa_view = Self::create_msaa_target(device, surface_format, width, height);

        Self {
            mesh_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes: Vec::new(),
            instance_buffer,
            line_buffer,
            depth_texture,
            msaa_view,
            surface_format,
            size: (width.max(1), height.max(1)),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.msaa_view = Self::create_msaa_target(device, self.surface_format, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn upload_geometries(&mut self, device: &wgpu::Device, scene: &SceneGraph) {
        for geometry in scene.geometries().iter().skip(self.meshes.len()) {
            let data = geometry.build();
            let vertices: Vec<Vertex> = data
                .positions
                .iter()
                .zip(&data.normals)
                .map(|(p, n)| Vertex {
                    position: *p,
                    normal: *n,
                })
                .collect();
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            tracing::debug!(
                kind = geometry.kind_name(),
                vertices = vertices.len(),
                indices = data.indices.len(),
                "geometry uploaded"
            );
            self.meshes.push(GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            });
        }
    }

    /// Render one frame of `scene` into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) {
        self.upload_geometries(device, scene);
        let mut frame = FrameData::gather(scene, camera);

        if frame.instance_count() > MAX_INSTANCES as usize {
            tracing::warn!(
                instances = frame.instance_count(),
                max = MAX_INSTANCES,
                "instance budget exceeded, dropping meshes"
            );
            let mut budget = MAX_INSTANCES as usize;
            for (_, batch) in &mut frame.batches {
                batch.truncate(budget);
                budget -= batch.len();
            }
        }
        frame.lines.truncate(MAX_LINE_VERTICES as usize);

        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        let instances: Vec<InstanceData> = frame
            .batches
            .iter()
            .flat_map(|(_, batch)| batch.iter().copied())
            .collect();
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        if !frame.lines.is_empty() {
            queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&frame.lines));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.msaa_view,
                    resolve_target: Some(view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let mut first = 0u32;
            for (handle, batch) in &frame.batches {
                let count = batch.len() as u32;
                if let Some(mesh) = self.meshes.get(handle.0 as usize) {
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, first..first + count);
                }
                first += count;
            }

            if !frame.lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                pass.draw(0..frame.lines.len() as u32, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    /// Multisampled color target resolved into the surface each frame.
    fn create_msaa_target(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa_color"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn multisample_state() -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: SAMPLE_COUNT,
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}
