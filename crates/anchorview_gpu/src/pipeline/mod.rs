//! wgpu consumption of the contract.
//!
//! Vertex buffer layouts and bind group layout entries are derived from the
//! slot tables and the selected shader variant, so the host never restates a
//! location, binding or format by hand.

pub mod builder;

pub use builder::{BindGroupLayoutBuilder, PipelineBuilder};

use crate::bindings::{
    group, BufferRole, ShaderFamily, SlotRole, TextureRole, VertexAttributeRole,
};
use crate::error::Result;
use crate::layout::GpuLayout;
use crate::specialization::{VertexComponentFormat, VertexFormats};
use crate::uniform::{AnchorInstanceUniforms, MaterialUniforms, SharedUniforms};

impl VertexComponentFormat {
    pub const fn wgpu_format(self) -> Option<wgpu::VertexFormat> {
        match self {
            VertexComponentFormat::Absent => None,
            VertexComponentFormat::Float2 => Some(wgpu::VertexFormat::Float32x2),
            VertexComponentFormat::Float3 => Some(wgpu::VertexFormat::Float32x3),
            VertexComponentFormat::Float4 => Some(wgpu::VertexFormat::Float32x4),
        }
    }
}

impl VertexAttributeRole {
    /// Storage format of this attribute under `formats`. Skinning and point
    /// color attributes have fixed formats.
    pub const fn wgpu_format(self, formats: &VertexFormats) -> Option<wgpu::VertexFormat> {
        match self {
            VertexAttributeRole::Position => formats.position.wgpu_format(),
            VertexAttributeRole::Texcoord => formats.texcoord.wgpu_format(),
            VertexAttributeRole::Normal => formats.normal.wgpu_format(),
            VertexAttributeRole::JointIndices => Some(wgpu::VertexFormat::Uint16x4),
            VertexAttributeRole::JointWeights => Some(wgpu::VertexFormat::Float32x4),
            VertexAttributeRole::Color => Some(wgpu::VertexFormat::Float32x4),
        }
    }
}

/// Owned description of one vertex buffer; borrow it as a
/// [`wgpu::VertexBufferLayout`] with [`VertexBufferDesc::layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferDesc {
    pub buffer: BufferRole,
    pub array_stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexBufferDesc {
    pub fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Vertex buffers for `family`, indexed by vertex buffer slot: positions in
/// slot 0, every other attribute interleaved in slot 1 in location order.
pub fn vertex_buffers(family: ShaderFamily, formats: &VertexFormats) -> Result<Vec<VertexBufferDesc>> {
    formats.validate_for(family)?;

    let descs: Vec<VertexBufferDesc> = [BufferRole::MeshPositions, BufferRole::MeshGenerics]
        .into_iter()
        .map(|buffer| {
            let mut offset = 0;
            let mut attributes = Vec::new();
            for role in family.attributes() {
                if role.source_buffer() != buffer {
                    continue;
                }
                if let Some(format) = role.wgpu_format(formats) {
                    attributes.push(wgpu::VertexAttribute {
                        format,
                        offset,
                        shader_location: role.slot(),
                    });
                    offset += format.size();
                }
            }
            VertexBufferDesc {
                buffer,
                array_stride: offset,
                attributes,
            }
        })
        .collect();

    log::debug!(
        "{:?} vertex layout: strides {:?}",
        family,
        descs.iter().map(|d| d.array_stride).collect::<Vec<_>>()
    );
    Ok(descs)
}

fn min_binding_size<T: GpuLayout>() -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new(u64::from(T::LAYOUT.size))
}

/// Shader stages that read `role`.
pub fn buffer_visibility(role: BufferRole) -> wgpu::ShaderStages {
    match role {
        BufferRole::MaterialUniforms => wgpu::ShaderStages::FRAGMENT,
        BufferRole::SharedUniforms => wgpu::ShaderStages::VERTEX_FRAGMENT,
        _ => wgpu::ShaderStages::VERTEX,
    }
}

/// Layout entry for a buffer in [`group::BUFFERS`]; the binding is the
/// buffer slot. Returns `None` for vertex buffers, which are not bound
/// through bind groups.
pub fn buffer_entry(role: BufferRole, visibility: wgpu::ShaderStages) -> Option<wgpu::BindGroupLayoutEntry> {
    let (ty, min_binding_size) = match role {
        BufferRole::MeshPositions | BufferRole::MeshGenerics => return None,
        BufferRole::AnchorInstanceUniforms => (
            wgpu::BufferBindingType::Storage { read_only: true },
            min_binding_size::<AnchorInstanceUniforms>(),
        ),
        BufferRole::SharedUniforms => (
            wgpu::BufferBindingType::Uniform,
            min_binding_size::<SharedUniforms>(),
        ),
        BufferRole::MaterialUniforms => (
            wgpu::BufferBindingType::Uniform,
            min_binding_size::<MaterialUniforms>(),
        ),
        BufferRole::TrackingPointData => (wgpu::BufferBindingType::Storage { read_only: true }, None),
    };
    Some(wgpu::BindGroupLayoutEntry {
        binding: role.slot(),
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    })
}

/// Like [`buffer_entry`], for a buffer holding several structs bound by
/// dynamic offset (per-pass [`SharedUniforms`], per-material
/// [`MaterialUniforms`]). Strides come from
/// [`FrameConfig`](crate::config::FrameConfig).
pub fn dynamic_buffer_entry(role: BufferRole, visibility: wgpu::ShaderStages) -> Option<wgpu::BindGroupLayoutEntry> {
    let mut entry = buffer_entry(role, visibility)?;
    if let wgpu::BindingType::Buffer {
        has_dynamic_offset, ..
    } = &mut entry.ty
    {
        *has_dynamic_offset = true;
    }
    Some(entry)
}

/// Layout entry for a texture in [`group::TEXTURES`]; the binding is the
/// texture slot.
pub fn texture_entry(role: TextureRole, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    let view_dimension = if role.is_cube() {
        wgpu::TextureViewDimension::Cube
    } else {
        wgpu::TextureViewDimension::D2
    };
    wgpu::BindGroupLayoutEntry {
        binding: role.slot(),
        visibility,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

/// Layout entry for the shared linear sampler in [`group::SAMPLERS`].
pub fn sampler_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: group::LINEAR_SAMPLER_BINDING,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Entries for every bind group `family` reads, indexed by group number.
pub fn family_layout_entries(family: ShaderFamily) -> [Vec<wgpu::BindGroupLayoutEntry>; 3] {
    let buffers = family
        .buffers()
        .iter()
        .filter_map(|role| buffer_entry(*role, buffer_visibility(*role)))
        .collect();
    let textures: Vec<wgpu::BindGroupLayoutEntry> = family
        .textures()
        .iter()
        .map(|role| texture_entry(*role, wgpu::ShaderStages::FRAGMENT))
        .collect();
    let samplers = if textures.is_empty() {
        Vec::new()
    } else {
        vec![sampler_entry(wgpu::ShaderStages::FRAGMENT)]
    };
    [buffers, textures, samplers]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{texture, BaseTexture, SceneTexture};

    #[test]
    fn test_anchor_vertex_buffers() {
        let formats = VertexFormats::for_family(ShaderFamily::Anchor);
        let buffers = vertex_buffers(ShaderFamily::Anchor, &formats).unwrap();
        assert_eq!(buffers.len(), 2);

        let positions = &buffers[BufferRole::MeshPositions.slot() as usize];
        assert_eq!(positions.buffer, BufferRole::MeshPositions);
        assert_eq!(positions.array_stride, 12);
        assert_eq!(positions.attributes.len(), 1);
        assert_eq!(positions.attributes[0].shader_location, 0);

        let generics = &buffers[BufferRole::MeshGenerics.slot() as usize];
        let locations: Vec<u32> = generics.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![1, 2, 3, 4]);
        let offsets: Vec<u64> = generics.attributes.iter().map(|a| a.offset).collect();
        // texcoord 8, normal 12, joint indices 8, joint weights 16
        assert_eq!(offsets, vec![0, 8, 20, 28]);
        assert_eq!(generics.array_stride, 44);
        assert_eq!(generics.layout().attributes.len(), 4);
    }

    #[test]
    fn test_point_vertex_buffers() {
        let formats = VertexFormats::for_family(ShaderFamily::Point);
        let buffers = vertex_buffers(ShaderFamily::Point, &formats).unwrap();
        assert_eq!(buffers[0].attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(buffers[1].attributes.len(), 1);
        assert_eq!(buffers[1].attributes[0].shader_location, 5);
        assert_eq!(buffers[1].array_stride, 16);
    }

    #[test]
    fn test_missing_format_rejected() {
        let formats = VertexFormats::for_family(ShaderFamily::Point);
        assert!(vertex_buffers(ShaderFamily::ImageCapture, &formats).is_err());
    }

    #[test]
    fn test_buffer_entries() {
        assert!(buffer_entry(BufferRole::MeshPositions, wgpu::ShaderStages::VERTEX).is_none());

        let shared = buffer_entry(BufferRole::SharedUniforms, wgpu::ShaderStages::VERTEX_FRAGMENT).unwrap();
        assert_eq!(shared.binding, 3);
        match shared.ty {
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                min_binding_size,
                ..
            } => assert_eq!(min_binding_size.map(|s| s.get()), Some(192)),
            other => panic!("unexpected binding type {other:?}"),
        }

        let instances =
            buffer_entry(BufferRole::AnchorInstanceUniforms, wgpu::ShaderStages::VERTEX).unwrap();
        assert!(matches!(
            instances.ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
    }

    #[test]
    fn test_dynamic_buffer_entry() {
        let static_entry = buffer_entry(BufferRole::MaterialUniforms, wgpu::ShaderStages::FRAGMENT).unwrap();
        assert!(matches!(
            static_entry.ty,
            wgpu::BindingType::Buffer { has_dynamic_offset: false, .. }
        ));

        let dynamic = dynamic_buffer_entry(BufferRole::MaterialUniforms, wgpu::ShaderStages::FRAGMENT).unwrap();
        assert_eq!(dynamic.binding, static_entry.binding);
        match dynamic.ty {
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size,
            } => {
                assert!(has_dynamic_offset);
                assert_eq!(min_binding_size.map(|s| s.get()), Some(48));
            }
            other => panic!("unexpected binding type {other:?}"),
        }

        assert!(dynamic_buffer_entry(BufferRole::MeshGenerics, wgpu::ShaderStages::VERTEX).is_none());
    }

    #[test]
    fn test_texture_entries() {
        let irradiance = texture_entry(
            TextureRole::Scene(SceneTexture::IrradianceMap),
            wgpu::ShaderStages::FRAGMENT,
        );
        assert_eq!(irradiance.binding, texture::IRRADIANCE_MAP);
        assert!(matches!(
            irradiance.ty,
            wgpu::BindingType::Texture {
                view_dimension: wgpu::TextureViewDimension::Cube,
                ..
            }
        ));

        let luma = texture_entry(TextureRole::Base(BaseTexture::Y), wgpu::ShaderStages::FRAGMENT);
        assert_eq!(luma.binding, texture::Y);
    }

    #[test]
    fn test_family_layout_entries() {
        let [buffers, textures, samplers] = family_layout_entries(ShaderFamily::Anchor);
        let bindings: Vec<u32> = buffers.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![2, 3, 4]);
        assert_eq!(textures.len(), 6);
        assert_eq!(samplers.len(), 1);

        let [buffers, textures, samplers] = family_layout_entries(ShaderFamily::ImageCapture);
        assert!(buffers.is_empty());
        let bindings: Vec<u32> = textures.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![texture::Y, texture::CBCR]);
        assert_eq!(samplers.len(), 1);

        let [buffers, textures, samplers] = family_layout_entries(ShaderFamily::Point);
        assert_eq!(buffers.len(), 2);
        assert!(textures.is_empty());
        assert!(samplers.is_empty());
    }
}
