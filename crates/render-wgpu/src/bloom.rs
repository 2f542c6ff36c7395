use bytemuck::{Pod, Zeroable};
use roadscene_render::BloomSettings;
use wgpu::util::DeviceExt;

use crate::shaders;

/// Format of the scene target and the half-resolution bloom targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct BloomParams {
    threshold: f32,
    strength: f32,
    radius: f32,
    _pad: f32,
    direction: [f32; 2],
    texel: [f32; 2],
}

impl BloomParams {
    /// `settings` of `None` composites the scene with no glow.
    pub(crate) fn new(settings: Option<BloomSettings>, direction: [f32; 2], half: (u32, u32)) -> Self {
        let s = settings.unwrap_or(BloomSettings {
            strength: 0.0,
            ..BloomSettings::default()
        });
        Self {
            threshold: s.threshold,
            strength: s.strength,
            radius: s.radius,
            _pad: 0.0,
            direction,
            texel: [1.0 / half.0 as f32, 1.0 / half.1 as f32],
        }
    }
}

/// Bloom targets are half the surface size, never zero.
pub(crate) fn half_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct Targets {
    hdr: wgpu::TextureView,
    bright: wgpu::TextureView,
    blurred: wgpu::TextureView,
    extract_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
    half: (u32, u32),
}

/// Post-process chain reading the HDR scene target.
///
/// extract (full -> half) -> blur horizontal -> blur vertical -> composite
/// (`scene + strength * bloom`) onto the surface view.
pub struct BloomPass {
    settings: Option<BloomSettings>,
    extract: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_h: wgpu::Buffer,
    params_v: wgpu::Buffer,
    targets: Targets,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        settings: Option<BloomSettings>,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLOOM_SHADER.into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let params_entry = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_composite_layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry, texture_entry(3)],
        });

        let make_pipeline = |label: &str,
                             layout: &wgpu::BindGroupLayout,
                             entry: &str,
                             format: wgpu::TextureFormat| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: Default::default(),
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };

        let extract = make_pipeline("bloom_extract", &layout, "fs_extract", HDR_FORMAT);
        let blur = make_pipeline("bloom_blur", &layout, "fs_blur", HDR_FORMAT);
        let composite = make_pipeline(
            "bloom_composite",
            &composite_layout,
            "fs_composite",
            surface_format,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let half = half_extent(width, height);
        let params_buffer = |label: &str, direction| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&BloomParams::new(settings, direction, half)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let params_h = params_buffer("bloom_params_h", [1.0, 0.0]);
        let params_v = params_buffer("bloom_params_v", [0.0, 1.0]);

        let targets = Self::create_targets(
            device,
            &layout,
            &composite_layout,
            &sampler,
            &params_h,
            &params_v,
            width,
            height,
        );

        Self {
            settings,
            extract,
            blur,
            composite,
            layout,
            composite_layout,
            sampler,
            params_h,
            params_v,
            targets,
        }
    }

    /// The scene pass renders here.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.targets.hdr
    }

    pub fn settings(&self) -> Option<BloomSettings> {
        self.settings
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        self.targets = Self::create_targets(
            device,
            &self.layout,
            &self.composite_layout,
            &self.sampler,
            &self.params_h,
            &self.params_v,
            width,
            height,
        );
        self.write_params(queue);
    }

    fn write_params(&self, queue: &wgpu::Queue) {
        let half = self.targets.half;
        queue.write_buffer(
            &self.params_h,
            0,
            bytemuck::bytes_of(&BloomParams::new(self.settings, [1.0, 0.0], half)),
        );
        queue.write_buffer(
            &self.params_v,
            0,
            bytemuck::bytes_of(&BloomParams::new(self.settings, [0.0, 1.0], half)),
        );
    }

    /// Record the bloom chain. Without bloom settings only the composite runs.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let t = &self.targets;
        if self.settings.is_some() {
            self.fullscreen(encoder, "bloom_extract", &self.extract, &t.extract_group, &t.bright);
            self.fullscreen(encoder, "bloom_blur_h", &self.blur, &t.blur_h_group, &t.blurred);
            self.fullscreen(encoder, "bloom_blur_v", &self.blur, &t.blur_v_group, &t.bright);
        }
        self.fullscreen(
            encoder,
            "bloom_composite",
            &self.composite,
            &t.composite_group,
            surface_view,
        );
    }

    fn fullscreen(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.draw(0..3, 0..1);
    }

    #[allow(clippy::too_many_arguments)]
    fn create_targets(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        params_h: &wgpu::Buffer,
        params_v: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) -> Targets {
        let half = half_extent(width, height);
        let hdr = color_target(device, "hdr_target", width.max(1), height.max(1));
        let bright = color_target(device, "bloom_bright", half.0, half.1);
        let blurred = color_target(device, "bloom_blurred", half.0, half.1);

        let group = |label: &str, source: &wgpu::TextureView, params: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params.as_entire_binding(),
                    },
                ],
            })
        };
        let extract_group = group("bloom_extract_group", &hdr, params_h);
        let blur_h_group = group("bloom_blur_h_group", &bright, params_h);
        let blur_v_group = group("bloom_blur_v_group", &blurred, params_v);

        let composite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom_composite_group"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&hdr),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_h.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&bright),
                },
            ],
        });

        Targets {
            hdr,
            bright,
            blurred,
            extract_group,
            blur_h_group,
            blur_v_group,
            composite_group,
            half,
        }
    }
}

fn color_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_extent_never_reaches_zero() {
        assert_eq!(half_extent(1280, 720), (640, 360));
        assert_eq!(half_extent(1, 1), (1, 1));
        assert_eq!(half_extent(0, 3), (1, 1));
    }

    #[test]
    fn params_carry_settings_and_texel_size() {
        let p = BloomParams::new(Some(BloomSettings::default()), [1.0, 0.0], (640, 360));
        assert_eq!(p.strength, 0.5);
        assert_eq!(p.threshold, 0.85);
        assert_eq!(p.radius, 0.4);
        assert_eq!(p.texel, [1.0 / 640.0, 1.0 / 360.0]);
    }

    #[test]
    fn disabled_bloom_has_zero_strength() {
        let p = BloomParams::new(None, [0.0, 1.0], (2, 2));
        assert_eq!(p.strength, 0.0);
    }

    #[test]
    fn params_match_uniform_layout() {
        assert_eq!(std::mem::size_of::<BloomParams>(), 32);
    }
}
