use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use roadscene_common::{Color, ObjectId, TextureId};
use roadscene_render::{PerspectiveCamera, RenderPipeline};
use roadscene_scene::{MaterialKind, SceneGraph, Texture, TriangleMesh};
use wgpu::util::DeviceExt;

use crate::bloom::{BloomPass, HDR_FORMAT};
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    flags: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// Interleave a mesh for upload. Missing normals or UVs are zero-filled.
fn interleave(mesh: &TriangleMesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect()
}

fn object_uniforms(model: Mat4, color: Color, kind: Option<MaterialKind>, textured: bool) -> ObjectUniforms {
    let lit = matches!(kind, Some(MaterialKind::Standard));
    ObjectUniforms {
        model: model.to_cols_array_2d(),
        color: color.to_linear_rgba(),
        flags: [
            if lit { 1.0 } else { 0.0 },
            if textured { 1.0 } else { 0.0 },
            0.0,
            0.0,
        ],
    }
}

fn cull_mode(double_sided: bool) -> Option<wgpu::Face> {
    (!double_sided).then_some(wgpu::Face::Back)
}

/// GPU copy of one scene object. Geometry is immutable after insertion, so
/// buffers are uploaded once; the uniform is rewritten every frame.
struct GpuObject {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Forward renderer for a [`SceneGraph`]: base pass into an HDR target,
/// then the bloom chain onto the surface.
pub struct WgpuRenderer {
    scene_pipeline: wgpu::RenderPipeline,
    /// Same as `scene_pipeline` without back-face culling.
    double_sided_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    objects: BTreeMap<ObjectId, GpuObject>,
    textures: BTreeMap<TextureId, wgpu::BindGroup>,
    depth_texture: wgpu::TextureView,
    bloom: BloomPass,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        pipeline: &RenderPipeline,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[uniform_entry(
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[uniform_entry(
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let make_pipeline = |label: &str, cull: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
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
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let scene_pipeline = make_pipeline("scene_pipeline", cull_mode(false));
        let double_sided_pipeline = make_pipeline("double_sided_pipeline", cull_mode(true));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("color_map_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let white = upload_texture(device, queue, &texture_layout, &sampler, &Texture::white());
        let depth_texture = Self::create_depth_texture(device, width, height);
        let bloom = BloomPass::new(device, surface_format, pipeline.bloom(), width, height);

        Self {
            scene_pipeline,
            double_sided_pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            texture_layout,
            sampler,
            white,
            objects: BTreeMap::new(),
            textures: BTreeMap::new(),
            depth_texture,
            bloom,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.bloom.resize(device, queue, width, height);
        tracing::debug!("render targets resized to {width}x{height}");
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of objects with uploaded geometry.
    pub fn uploaded_objects(&self) -> usize {
        self.objects.len()
    }

    /// Render one frame of `scene` into `view`.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) {
        let (light_dir, light_color) = match scene.light() {
            Some(light) => (
                light.direction().extend(light.intensity).to_array(),
                light.color.to_linear_rgba(),
            ),
            None => ([0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]),
        };
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                light_dir,
                light_color,
            }),
        );

        self.prepare(device, queue, scene);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("base_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.bloom.hdr_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
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
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (id, _) in scene.iter() {
                let Some(gpu) = self.objects.get(&id) else {
                    continue;
                };
                if gpu.index_count == 0 {
                    continue;
                }
                let material = scene.material_of(id);
                let pipeline = if material.is_some_and(|m| m.double_sided) {
                    &self.double_sided_pipeline
                } else {
                    &self.scene_pipeline
                };
                let texture = material
                    .and_then(|m| m.map)
                    .and_then(|t| self.textures.get(&t))
                    .unwrap_or(&self.white);
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &gpu.bind_group, &[]);
                pass.set_bind_group(2, texture, &[]);
                pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }

        self.bloom.execute(&mut encoder, view);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload anything new and refresh per-object uniforms.
    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &SceneGraph) {
        for (id, object) in scene.iter() {
            let material = object.material.and_then(|m| scene.material(m));

            if let Some(texture_id) = material.and_then(|m| m.map)
                && !self.textures.contains_key(&texture_id)
                && let Some(texture) = scene.texture(texture_id)
            {
                let group = upload_texture(device, queue, &self.texture_layout, &self.sampler, texture);
                self.textures.insert(texture_id, group);
            }

            let uniforms = object_uniforms(
                object.transform.matrix(),
                material.map_or(Color::WHITE, |m| m.color),
                material.map(|m| m.kind),
                material.is_some_and(|m| m.map.is_some()),
            );

            match self.objects.get(&id) {
                Some(gpu) => queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms)),
                None => {
                    let mesh = object.geometry.tessellate();
                    let gpu = self.upload_object(device, &mesh, &uniforms);
                    tracing::debug!(
                        "uploaded {} ({} triangles)",
                        object.name,
                        mesh.triangle_count()
                    );
                    self.objects.insert(id, gpu);
                }
            }
        }
    }

    fn upload_object(&self, device: &wgpu::Device, mesh: &TriangleMesh, uniforms: &ObjectUniforms) -> GpuObject {
        let vertices = interleave(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_uniforms"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        GpuObject {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: &Texture,
) -> wgpu::BindGroup {
    let gpu_texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("color_map"),
            size: wgpu::Extent3d {
                width: texture.width.max(1),
                height: texture.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &texture.rgba,
    );
    let view = gpu_texture.create_view(&Default::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("color_map_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
