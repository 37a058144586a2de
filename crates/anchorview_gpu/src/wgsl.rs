//! WGSL declaration of the contract.
//!
//! The shader side includes [`shader_prelude`] ahead of its own code instead
//! of restating slot numbers, override ids and struct layouts by hand.

use crate::bindings::{self, group, BufferRole, SlotRole, TextureRole};
use crate::layout::{self, StructLayout};
use crate::modes::{QualityTier, Viewport};
use crate::registry::SlotTable;
use crate::specialization::{self, MaterialFeature, VertexComponentFormat, VertexFormatKey};

const HEADER: &str = "// Generated by anchorview_gpu. Do not edit.\n";

fn push_const(out: &mut String, name: &str, value: u32) {
    out.push_str(&format!("const {name}: u32 = {value}u;\n"));
}

fn push_table(out: &mut String, title: &str, prefix: &str, table: &SlotTable<'_>) {
    out.push_str(&format!("\n// {title}\n"));
    for entry in table.sorted_entries() {
        push_const(out, &format!("{prefix}_{}", entry.name.to_uppercase()), entry.slot);
    }
    for slot in table.retired {
        out.push_str(&format!("// {prefix} slot {slot} retired\n"));
    }
}

/// WGSL identifier of the override constant for a material flag.
pub fn material_flag_name(feature: MaterialFeature) -> String {
    format!("has_{}", feature.name())
}

/// WGSL identifier of the override constant for a vertex-format selector.
pub fn vertex_format_name(key: VertexFormatKey) -> String {
    format!("vertex_format_{}", key.name())
}

/// Override declarations, one per specialization key. They carry no
/// initializer, so every key must be supplied when a pipeline is built.
pub fn override_declarations() -> String {
    let mut out = String::from("\n// Specialization constants\n");
    for feature in MaterialFeature::ALL {
        out.push_str(&format!(
            "@id({}) override {}: bool;\n",
            feature.slot(),
            material_flag_name(*feature)
        ));
    }
    for key in VertexFormatKey::ALL {
        out.push_str(&format!(
            "@id({}) override {}: u32;\n",
            key.slot(),
            vertex_format_name(*key)
        ));
    }
    out
}

/// Struct declaration following the documented layout.
pub fn struct_declaration(layout: &StructLayout) -> String {
    let mut out = format!("\nstruct {} {{\n", layout.name);
    for field in layout.fields {
        let size = if field.size != field.kind.natural_size() {
            format!("@size({}) ", field.size)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "    {size}{}: {},\n",
            field.name,
            field.kind.wgsl_type()
        ));
    }
    for reserved in layout.reserved {
        out.push_str(&format!(
            "    // reserved, not allocated: {}: {} ({})\n",
            reserved.name, reserved.wgsl_type, reserved.note
        ));
    }
    out.push_str("}\n");
    out
}

fn texture_type(role: TextureRole) -> &'static str {
    if role.is_cube() {
        "texture_cube<f32>"
    } else {
        "texture_2d<f32>"
    }
}

fn binding_declarations() -> String {
    let mut out = String::from("\n// Bindings\n");
    let buffer_vars = [
        (
            BufferRole::AnchorInstanceUniforms,
            "var<storage, read> anchor_instances: array<AnchorInstanceUniforms>",
        ),
        (
            BufferRole::SharedUniforms,
            "var<uniform> shared_uniforms: SharedUniforms",
        ),
        (
            BufferRole::MaterialUniforms,
            "var<uniform> material_uniforms: MaterialUniforms",
        ),
    ];
    for (role, declaration) in buffer_vars {
        out.push_str(&format!(
            "@group({}) @binding({}) {declaration};\n",
            group::BUFFERS,
            role.slot()
        ));
    }
    for role in TextureRole::all() {
        out.push_str(&format!(
            "@group({}) @binding({}) var {}_texture: {};\n",
            group::TEXTURES,
            role.slot(),
            role.name(),
            texture_type(role)
        ));
    }
    out.push_str(&format!(
        "@group({}) @binding({}) var linear_sampler: sampler;\n",
        group::SAMPLERS,
        group::LINEAR_SAMPLER_BINDING
    ));
    out
}

fn mode_constants() -> String {
    let mut out = String::from("\n// Viewports\n");
    for viewport in Viewport::ALL {
        let name = format!("{viewport:?}").to_uppercase();
        push_const(&mut out, &format!("VIEWPORT_{name}"), viewport.index() as u32);
    }
    push_const(&mut out, "NUM_VIEWPORTS", Viewport::COUNT as u32);

    out.push_str("\n// Quality levels\n");
    for tier in QualityTier::ALL {
        let name = format!("{tier:?}").to_uppercase();
        push_const(&mut out, &format!("QUALITY_{name}"), tier.index() as u32);
    }
    push_const(&mut out, "NUM_QUALITY_LEVELS", QualityTier::COUNT as u32);
    out
}

/// Full WGSL prelude: slot constants, override declarations, uniform structs
/// and binding declarations.
pub fn shader_prelude() -> String {
    let mut out = String::from(HEADER);

    push_table(&mut out, "Buffer slots", "BUFFER", &bindings::buffer::TABLE);
    push_table(
        &mut out,
        "Vertex attribute locations",
        "ATTRIBUTE",
        &bindings::vertex_attribute::TABLE,
    );
    push_table(&mut out, "Texture slots", "TEXTURE", &bindings::texture::BASE_TIER);
    push_table(&mut out, "Scene texture slots", "TEXTURE", &bindings::texture::SCENE_TIER);
    push_const(&mut out, "TEXTURE_SCENE_TIER_START", bindings::texture::SCENE_TIER_START);
    push_table(&mut out, "Bind groups", "GROUP", &group::TABLE);

    push_table(
        &mut out,
        "Material flag ids",
        "FLAG",
        &specialization::material_flag::TABLE,
    );
    push_table(
        &mut out,
        "Vertex format ids",
        "VERTEX_FORMAT_ID",
        &specialization::vertex_format::TABLE,
    );
    push_const(&mut out, "VERTEX_FORMAT_START", specialization::VERTEX_FORMAT_START);

    out.push_str("\n// Vertex format selector values\n");
    for format in [
        VertexComponentFormat::Absent,
        VertexComponentFormat::Float2,
        VertexComponentFormat::Float3,
        VertexComponentFormat::Float4,
    ] {
        let name = format!("{format:?}").to_uppercase();
        push_const(&mut out, &format!("VERTEX_FORMAT_{name}"), format.value());
    }

    out.push_str(&mode_constants());
    out.push_str(&override_declarations());
    for structure in layout::ALL {
        out.push_str(&struct_declaration(&structure));
    }
    out.push_str(&binding_declarations());

    log::debug!("Generated WGSL prelude ({} bytes)", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_constants_emitted() {
        let prelude = shader_prelude();
        assert!(prelude.starts_with(HEADER));
        assert!(prelude.contains("const BUFFER_MESH_POSITIONS: u32 = 0u;"));
        assert!(prelude.contains("const BUFFER_TRACKING_POINT_DATA: u32 = 5u;"));
        assert!(prelude.contains("const ATTRIBUTE_COLOR: u32 = 5u;"));
        assert!(prelude.contains("const TEXTURE_AMBIENT_OCCLUSION: u32 = 6u;"));
        assert!(prelude.contains("const TEXTURE_IRRADIANCE_MAP: u32 = 7u;"));
        assert!(prelude.contains("const TEXTURE_SCENE_TIER_START: u32 = 7u;"));
        assert!(prelude.contains("const VERTEX_FORMAT_START: u32 = 6u;"));
        assert!(prelude.contains("const VERTEX_FORMAT_ID_BITANGENT: u32 = 10u;"));
        assert!(prelude.contains("const NUM_VIEWPORTS: u32 = 2u;"));
        assert!(prelude.contains("const QUALITY_LOW: u32 = 2u;"));
        assert!(prelude.contains("const VERTEX_FORMAT_FLOAT3: u32 = 2u;"));
    }

    #[test]
    fn test_overrides_cover_every_key() {
        let overrides = override_declarations();
        assert_eq!(
            overrides.matches("override").count(),
            specialization::KEY_COUNT as usize
        );
        assert!(overrides.contains("@id(0) override has_base_color_map: bool;"));
        assert!(overrides.contains("@id(5) override has_irradiance_map: bool;"));
        assert!(overrides.contains("@id(6) override vertex_format_position: u32;"));
        // No initializers: a missing value must fail pipeline creation.
        assert!(!overrides.contains('='));
    }

    #[test]
    fn test_struct_padding_is_explicit() {
        let shared = struct_declaration(&layout::SHARED_UNIFORMS);
        assert_eq!(shared.matches("@size(16)").count(), 3);
        assert!(shared.contains("    @size(16) ambient_light_color: vec3<f32>,\n"));
        assert!(shared.contains("    material_shininess: f32,\n"));
        assert!(shared.contains("// reserved, not allocated: irradiance_map_weight"));

        let material = struct_declaration(&layout::MATERIAL_UNIFORMS);
        assert!(!material.contains("@size"));
        assert!(material.contains("// reserved, not allocated: ambient_occlusion"));
        assert!(material.contains("// reserved, not allocated: map_weights"));
    }

    #[test]
    fn test_binding_declarations() {
        let prelude = shader_prelude();
        assert!(prelude.contains("@group(0) @binding(3) var<uniform> shared_uniforms: SharedUniforms;"));
        assert!(prelude.contains(
            "@group(0) @binding(2) var<storage, read> anchor_instances: array<AnchorInstanceUniforms>;"
        ));
        assert!(prelude.contains("@group(1) @binding(0) var color_texture: texture_2d<f32>;"));
        assert!(prelude.contains("@group(1) @binding(7) var irradiance_map_texture: texture_cube<f32>;"));
        assert!(prelude.contains("@group(2) @binding(0) var linear_sampler: sampler;"));
    }
}
