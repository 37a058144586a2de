//! Binding, specialization and uniform layout contract between the AR scene
//! renderer and its shaders.
//!
//! Slot numbers, override ids and uniform layouts are defined once here. The
//! host side consumes them through [`pipeline`], the shader side through the
//! WGSL prelude produced by [`wgsl::shader_prelude`].

#[macro_use]
mod macros;

pub mod bindings;
pub mod config;
pub mod error;
pub mod layout;
pub mod modes;
pub mod pipeline;
pub mod registry;
pub mod specialization;
pub mod uniform;
pub mod wgsl;

pub use bindings::{BaseTexture, BufferRole, SceneTexture, ShaderFamily, TextureRole, VertexAttributeRole};
pub use config::{FrameConfig, ViewportMode};
pub use error::{ContractError, Result};
pub use layout::GpuLayout;
pub use modes::{QualityTier, Viewport};
pub use specialization::{MaterialFeature, MaterialFeatures, ShaderVariant, VertexComponentFormat, VertexFormats};
pub use uniform::{AnchorInstanceUniforms, CameraParams, LightingParams, MaterialUniforms, SharedUniforms};

fn check_size<T: GpuLayout>() -> Result<()> {
    let layout = T::LAYOUT;
    let size = std::mem::size_of::<T>();
    if size != layout.size as usize {
        return Err(ContractError::StructSize {
            structure: layout.name.to_string(),
            size: size as u32,
            expected: layout.size,
        });
    }
    Ok(())
}

/// Check every table and layout at runtime.
///
/// The same properties are asserted at compile time. This form reports
/// which table or field is wrong.
pub fn validate_contract() -> Result<()> {
    for table in bindings::tables() {
        table.validate()?;
    }
    registry::validate_tiers(&[&bindings::texture::BASE_TIER, &bindings::texture::SCENE_TIER])?;

    let [flags, formats] = specialization::tables();
    registry::validate_tiers(&[&flags, &formats])?;

    for structure in layout::ALL {
        structure.validate()?;
    }
    check_size::<SharedUniforms>()?;
    check_size::<AnchorInstanceUniforms>()?;
    check_size::<MaterialUniforms>()?;

    log::info!(
        "Contract valid: {} texture slots, {} specialization keys, {} uniform structs",
        bindings::texture::COUNT,
        specialization::KEY_COUNT,
        layout::ALL.len()
    );
    Ok(())
}
