//! Pipeline builder for reducing boilerplate in render pipeline creation.
//!
//! Vertex buffers, bind group layouts and override constants come from the
//! shader family and [`ShaderVariant`], so the only inputs the caller picks
//! are the shader module, the targets and fixed-function state.

use super::{buffer_entry, buffer_visibility, dynamic_buffer_entry, family_layout_entries, sampler_entry, texture_entry};
use super::vertex_buffers;
use crate::bindings::{BufferRole, ShaderFamily, TextureRole};
use crate::error::{ContractError, Result};
use crate::specialization::ShaderVariant;

/// Builder for render pipelines specialized to one [`ShaderVariant`].
///
/// # Example
/// ```ignore
/// let variant = ShaderVariant::new(features, VertexFormats::for_family(ShaderFamily::Anchor));
/// let [buffers, textures, samplers] = BindGroupLayoutBuilder::for_family(&device, ShaderFamily::Anchor);
/// let pipeline = PipelineBuilder::new(&device, format, ShaderFamily::Anchor, &variant)
///     .with_shader(&shader, "vs_main", "fs_main")
///     .with_depth_format(wgpu::TextureFormat::Depth32Float)
///     .with_bind_group_layouts(&[&buffers, &textures, &samplers])
///     .build()?;
/// ```
pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    format: wgpu::TextureFormat,
    family: ShaderFamily,
    variant: &'a ShaderVariant,
    label: Option<&'a str>,
    shader: Option<&'a wgpu::ShaderModule>,
    vs_entry: &'a str,
    fs_entry: &'a str,
    bind_group_layouts: Vec<&'a wgpu::BindGroupLayout>,
    blend_state: Option<wgpu::BlendState>,
    cull_mode: Option<wgpu::Face>,
    topology: wgpu::PrimitiveTopology,
    depth_format: Option<wgpu::TextureFormat>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        format: wgpu::TextureFormat,
        family: ShaderFamily,
        variant: &'a ShaderVariant,
    ) -> Self {
        let topology = match family {
            ShaderFamily::Point => wgpu::PrimitiveTopology::PointList,
            ShaderFamily::ImageCapture => wgpu::PrimitiveTopology::TriangleStrip,
            ShaderFamily::Anchor => wgpu::PrimitiveTopology::TriangleList,
        };
        Self {
            device,
            format,
            family,
            variant,
            label: None,
            shader: None,
            vs_entry: "vs_main",
            fs_entry: "fs_main",
            bind_group_layouts: Vec::new(),
            blend_state: None,
            cull_mode: None,
            topology,
            depth_format: None,
        }
    }

    /// Set the pipeline label for debugging.
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the shader module and entry points. The module must include the
    /// generated prelude so every override id resolves.
    pub fn with_shader(
        mut self,
        shader: &'a wgpu::ShaderModule,
        vs_entry: &'a str,
        fs_entry: &'a str,
    ) -> Self {
        self.shader = Some(shader);
        self.vs_entry = vs_entry;
        self.fs_entry = fs_entry;
        self
    }

    /// Set all bind group layouts, indexed by group number.
    pub fn with_bind_group_layouts(mut self, layouts: &[&'a wgpu::BindGroupLayout]) -> Self {
        self.bind_group_layouts = layouts.to_vec();
        self
    }

    /// Set the blend state (default: REPLACE).
    pub fn with_blend_state(mut self, blend: wgpu::BlendState) -> Self {
        self.blend_state = Some(blend);
        self
    }

    pub fn with_cull_mode(mut self, cull: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull;
        self
    }

    /// Override the family's default topology.
    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Enable depth testing against a target of `format`.
    pub fn with_depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Build the render pipeline.
    ///
    /// Fails if no shader module was provided or the variant's vertex formats
    /// do not cover the family's attributes.
    pub fn build(self) -> Result<wgpu::RenderPipeline> {
        let shader = self.shader.ok_or_else(|| {
            ContractError::Pipeline("PipelineBuilder requires a shader module".to_string())
        })?;

        let buffer_descs = vertex_buffers(self.family, &self.variant.vertex_formats)?;
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            buffer_descs.iter().map(|desc| desc.layout()).collect();

        let overrides = self.variant.override_constants();
        let constants: Vec<(&str, f64)> = overrides
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
            .collect();

        log::debug!(
            "Building {:?} pipeline {} with {} override constants",
            self.family,
            self.variant.cache_key(),
            constants.len()
        );

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: self.label.map(|l| format!("{} Layout", l)).as_deref(),
            bind_group_layouts: &self.bind_group_layouts,
            push_constant_ranges: &[],
        });

        let depth_stencil = self.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        Ok(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: self.label,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(self.vs_entry),
                buffers: &buffers,
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &constants,
                    zero_initialize_workgroup_memory: true,
                },
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(self.fs_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: self.blend_state,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &constants,
                    zero_initialize_workgroup_memory: true,
                },
            }),
            primitive: wgpu::PrimitiveState {
                topology: self.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        }))
    }
}

/// Helper for creating bind group layouts whose bindings are contract slots.
pub struct BindGroupLayoutBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<&'a str>,
    entries: Vec<wgpu::BindGroupLayoutEntry>,
}

impl<'a> BindGroupLayoutBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            label: None,
            entries: Vec::new(),
        }
    }

    /// Set the layout label.
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Add a buffer at its slot. Vertex buffers are skipped.
    pub fn add_buffer(mut self, role: BufferRole) -> Self {
        if let Some(entry) = buffer_entry(role, buffer_visibility(role)) {
            self.entries.push(entry);
        }
        self
    }

    /// Add a buffer at its slot, bound by dynamic offset.
    pub fn add_dynamic_buffer(mut self, role: BufferRole) -> Self {
        if let Some(entry) = dynamic_buffer_entry(role, buffer_visibility(role)) {
            self.entries.push(entry);
        }
        self
    }

    /// Add a fragment-stage texture at its slot.
    pub fn add_texture(mut self, role: impl Into<TextureRole>) -> Self {
        self.entries
            .push(texture_entry(role.into(), wgpu::ShaderStages::FRAGMENT));
        self
    }

    /// Add the shared filtering sampler.
    pub fn add_sampler(mut self) -> Self {
        self.entries.push(sampler_entry(wgpu::ShaderStages::FRAGMENT));
        self
    }

    /// Build the bind group layout.
    pub fn build(self) -> wgpu::BindGroupLayout {
        self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: self.label,
            entries: &self.entries,
        })
    }

    /// Build the buffer, texture and sampler layouts for `family`, indexed by
    /// group number. Groups the family does not read are empty.
    pub fn for_family(device: &wgpu::Device, family: ShaderFamily) -> [wgpu::BindGroupLayout; 3] {
        family_layout_entries(family).map(|entries| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &entries,
            })
        })
    }
}
