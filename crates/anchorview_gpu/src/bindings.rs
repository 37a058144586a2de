//! Shader binding slots.
//!
//! This module defines the slot numbers shared between the host renderer and
//! the shaders: buffer bindings, vertex attribute locations, texture bindings
//! and the bind groups that hold them. The numbers are the versioned contract.
//! They are append-only: a new role takes the next trailing number, a retired
//! role leaves a gap that is never reused, and renumbering an existing role is
//! a breaking change for every compiled shader.
//!
//! # Usage
//!
//! In Rust code:
//! ```ignore
//! use anchorview_gpu::bindings::{slot_for, BufferRole};
//! pass.set_vertex_buffer(slot_for(BufferRole::MeshPositions), positions.slice(..));
//! ```
//!
//! In WGSL shaders, the same numbers come from the generated prelude:
//! ```wgsl
//! @group(0) @binding(3)  // GROUP_BUFFERS, BUFFER_SHARED_UNIFORMS
//! var<uniform> shared_uniforms: SharedUniforms;
//! ```

use crate::registry::{tiers_are_contiguous, SlotTable};

/// Which part of the renderer consumes a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerCategory {
    /// Per-draw geometry and instance data.
    Mesh,
    /// Per-material parameters and maps.
    Material,
    /// Per-frame or per-eye resources shared by every draw.
    Scene,
}

/// A role with a fixed slot inside one category.
///
/// Roles of different categories are different types, so asking for a slot
/// with a role from the wrong category does not compile.
pub trait SlotRole: Copy {
    const CATEGORY: &'static str;

    fn slot(self) -> u32;

    fn name(self) -> &'static str;

    fn consumer(self) -> ConsumerCategory;
}

/// Slot number for `role`.
pub fn slot_for<R: SlotRole>(role: R) -> u32 {
    role.slot()
}

/// Buffer binding slots.
///
/// The first two are vertex buffer slots; the rest are bindings in
/// [`group::BUFFERS`].
pub mod buffer {
    use super::BufferRole;
    use crate::registry::SlotTable;

    /// Vertex positions of a mesh.
    pub const MESH_POSITIONS: u32 = 0;
    /// Interleaved non-position vertex data of a mesh.
    pub const MESH_GENERICS: u32 = MESH_POSITIONS + 1;
    /// Array of [`AnchorInstanceUniforms`](crate::uniform::AnchorInstanceUniforms),
    /// indexed by instance index.
    pub const ANCHOR_INSTANCE_UNIFORMS: u32 = MESH_GENERICS + 1;
    /// [`SharedUniforms`](crate::uniform::SharedUniforms) for the current eye.
    pub const SHARED_UNIFORMS: u32 = ANCHOR_INSTANCE_UNIFORMS + 1;
    /// [`MaterialUniforms`](crate::uniform::MaterialUniforms) of the bound material.
    pub const MATERIAL_UNIFORMS: u32 = SHARED_UNIFORMS + 1;
    /// Tracked feature points drawn by the point shaders.
    pub const TRACKING_POINT_DATA: u32 = MATERIAL_UNIFORMS + 1;

    pub const TABLE: SlotTable<'static> = SlotTable::new(BufferRole::CATEGORY, 0, BufferRole::ENTRIES);

    const _: () = assert!(TABLE.is_valid());
}

/// Vertex attribute locations.
pub mod vertex_attribute {
    use super::VertexAttributeRole;
    use crate::registry::SlotTable;

    pub const POSITION: u32 = 0;
    pub const TEXCOORD: u32 = POSITION + 1;
    pub const NORMAL: u32 = TEXCOORD + 1;
    pub const JOINT_INDICES: u32 = NORMAL + 1;
    pub const JOINT_WEIGHTS: u32 = JOINT_INDICES + 1;
    pub const COLOR: u32 = JOINT_WEIGHTS + 1;

    pub const TABLE: SlotTable<'static> =
        SlotTable::new(VertexAttributeRole::CATEGORY, 0, VertexAttributeRole::ENTRIES);

    const _: () = assert!(TABLE.is_valid());
}

/// Texture binding slots, bindings in [`group::TEXTURES`].
///
/// The base tier is dense from 0. The scene tier starts right after it;
/// new scene-level textures append after [`IRRADIANCE_MAP`], and base-tier
/// numbers are never changed to make room.
pub mod texture {
    use super::{tiers_are_contiguous, BaseTexture, SceneTexture};
    use crate::registry::SlotTable;

    /// Base color map.
    pub const COLOR: u32 = 0;
    /// Luma plane of the camera capture.
    pub const Y: u32 = COLOR + 1;
    /// Chroma plane of the camera capture.
    pub const CBCR: u32 = Y + 1;
    pub const METALLIC: u32 = CBCR + 1;
    pub const ROUGHNESS: u32 = METALLIC + 1;
    pub const NORMAL: u32 = ROUGHNESS + 1;
    pub const AMBIENT_OCCLUSION: u32 = NORMAL + 1;

    pub const BASE_TIER: SlotTable<'static> =
        SlotTable::new(BaseTexture::CATEGORY, 0, BaseTexture::ENTRIES);

    /// First scene-tier slot: the number of base-tier slots.
    pub const SCENE_TIER_START: u32 = BASE_TIER.end();

    /// Environment irradiance cube map.
    pub const IRRADIANCE_MAP: u32 = SCENE_TIER_START;

    pub const SCENE_TIER: SlotTable<'static> =
        SlotTable::new(SceneTexture::CATEGORY, SCENE_TIER_START, SceneTexture::ENTRIES);

    /// One past the last texture slot.
    pub const COUNT: u32 = SCENE_TIER.end();

    const _: () = assert!(tiers_are_contiguous(&[&BASE_TIER, &SCENE_TIER]));
    const _: () = assert!(SCENE_TIER_START == AMBIENT_OCCLUSION + 1);
}

/// Bind group numbers used by the wgpu backend.
///
/// Buffers, textures and samplers get a group each so their binding numbers
/// can be the slot numbers above without colliding.
pub mod group {
    use crate::registry::{SlotEntry, SlotTable};

    pub const BUFFERS: u32 = 0;
    pub const TEXTURES: u32 = BUFFERS + 1;
    pub const SAMPLERS: u32 = TEXTURES + 1;

    pub const TABLE: SlotTable<'static> = SlotTable::new(
        "group",
        0,
        &[
            SlotEntry::new("buffers", BUFFERS),
            SlotEntry::new("textures", TEXTURES),
            SlotEntry::new("samplers", SAMPLERS),
        ],
    );

    /// Binding 0 in the sampler group: linear filtering sampler.
    pub const LINEAR_SAMPLER_BINDING: u32 = 0;

    const _: () = assert!(TABLE.is_valid());
}

slot_roles! {
    /// Buffer binding roles.
    pub enum BufferRole in "buffer" {
        MeshPositions = buffer::MESH_POSITIONS, "mesh_positions", Mesh;
        MeshGenerics = buffer::MESH_GENERICS, "mesh_generics", Mesh;
        AnchorInstanceUniforms = buffer::ANCHOR_INSTANCE_UNIFORMS, "anchor_instance_uniforms", Mesh;
        SharedUniforms = buffer::SHARED_UNIFORMS, "shared_uniforms", Scene;
        MaterialUniforms = buffer::MATERIAL_UNIFORMS, "material_uniforms", Material;
        TrackingPointData = buffer::TRACKING_POINT_DATA, "tracking_point_data", Scene;
    }
}

slot_roles! {
    /// Vertex attribute roles.
    pub enum VertexAttributeRole in "vertex_attribute" {
        Position = vertex_attribute::POSITION, "position", Mesh;
        Texcoord = vertex_attribute::TEXCOORD, "texcoord", Mesh;
        Normal = vertex_attribute::NORMAL, "normal", Mesh;
        JointIndices = vertex_attribute::JOINT_INDICES, "joint_indices", Mesh;
        JointWeights = vertex_attribute::JOINT_WEIGHTS, "joint_weights", Mesh;
        Color = vertex_attribute::COLOR, "color", Mesh;
    }
}

slot_roles! {
    /// Base-tier texture roles.
    pub enum BaseTexture in "texture_base" {
        Color = texture::COLOR, "color", Material;
        Y = texture::Y, "y", Scene;
        CbCr = texture::CBCR, "cbcr", Scene;
        Metallic = texture::METALLIC, "metallic", Material;
        Roughness = texture::ROUGHNESS, "roughness", Material;
        Normal = texture::NORMAL, "normal", Material;
        AmbientOcclusion = texture::AMBIENT_OCCLUSION, "ambient_occlusion", Material;
    }
}

slot_roles! {
    /// Scene-tier texture roles.
    pub enum SceneTexture in "texture_scene" {
        IrradianceMap = texture::IRRADIANCE_MAP, "irradiance_map", Scene;
    }
}

/// Any texture role, either tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Base(BaseTexture),
    Scene(SceneTexture),
}

impl TextureRole {
    /// Every texture role ordered by slot.
    pub fn all() -> impl Iterator<Item = TextureRole> {
        BaseTexture::ALL
            .iter()
            .copied()
            .map(TextureRole::Base)
            .chain(SceneTexture::ALL.iter().copied().map(TextureRole::Scene))
    }

    pub fn from_slot(slot: u32) -> Option<Self> {
        BaseTexture::from_slot(slot)
            .map(TextureRole::Base)
            .or_else(|| SceneTexture::from_slot(slot).map(TextureRole::Scene))
    }

    /// Cube maps are sampled by direction; everything else is 2D.
    pub const fn is_cube(self) -> bool {
        matches!(self, TextureRole::Scene(SceneTexture::IrradianceMap))
    }
}

impl SlotRole for TextureRole {
    const CATEGORY: &'static str = "texture";

    fn slot(self) -> u32 {
        match self {
            TextureRole::Base(role) => role.slot(),
            TextureRole::Scene(role) => role.slot(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            TextureRole::Base(role) => role.name(),
            TextureRole::Scene(role) => role.name(),
        }
    }

    fn consumer(self) -> ConsumerCategory {
        match self {
            TextureRole::Base(role) => role.consumer(),
            TextureRole::Scene(role) => role.consumer(),
        }
    }
}

impl From<BaseTexture> for TextureRole {
    fn from(role: BaseTexture) -> Self {
        TextureRole::Base(role)
    }
}

impl From<SceneTexture> for TextureRole {
    fn from(role: SceneTexture) -> Self {
        TextureRole::Scene(role)
    }
}

impl VertexAttributeRole {
    /// Vertex buffer slot that feeds this attribute.
    pub const fn source_buffer(self) -> BufferRole {
        match self {
            VertexAttributeRole::Position => BufferRole::MeshPositions,
            _ => BufferRole::MeshGenerics,
        }
    }
}

/// Shader programs that read mesh vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFamily {
    /// Full-screen camera passthrough.
    ImageCapture,
    /// Anchored, optionally skinned, content.
    Anchor,
    /// Tracked feature points.
    Point,
}

impl ShaderFamily {
    pub const ALL: [ShaderFamily; 3] = [
        ShaderFamily::ImageCapture,
        ShaderFamily::Anchor,
        ShaderFamily::Point,
    ];

    /// Vertex attributes this family declares, by location.
    pub const fn attributes(self) -> &'static [VertexAttributeRole] {
        use VertexAttributeRole::*;
        match self {
            ShaderFamily::ImageCapture => &[Position, Texcoord],
            ShaderFamily::Anchor => &[Position, Texcoord, Normal, JointIndices, JointWeights],
            ShaderFamily::Point => &[Position, Color],
        }
    }

    /// Buffers bound in [`group::BUFFERS`] for this family.
    pub const fn buffers(self) -> &'static [BufferRole] {
        match self {
            ShaderFamily::ImageCapture => &[],
            ShaderFamily::Anchor => &[
                BufferRole::AnchorInstanceUniforms,
                BufferRole::SharedUniforms,
                BufferRole::MaterialUniforms,
            ],
            ShaderFamily::Point => &[BufferRole::SharedUniforms, BufferRole::TrackingPointData],
        }
    }

    /// Textures bound in [`group::TEXTURES`] for this family.
    pub const fn textures(self) -> &'static [TextureRole] {
        match self {
            ShaderFamily::ImageCapture => &[
                TextureRole::Base(BaseTexture::Y),
                TextureRole::Base(BaseTexture::CbCr),
            ],
            ShaderFamily::Anchor => &[
                TextureRole::Base(BaseTexture::Color),
                TextureRole::Base(BaseTexture::Metallic),
                TextureRole::Base(BaseTexture::Roughness),
                TextureRole::Base(BaseTexture::Normal),
                TextureRole::Base(BaseTexture::AmbientOcclusion),
                TextureRole::Scene(SceneTexture::IrradianceMap),
            ],
            ShaderFamily::Point => &[],
        }
    }
}

/// Every binding table, in the order tooling lists them.
pub fn tables() -> [SlotTable<'static>; 5] {
    [
        buffer::TABLE,
        vertex_attribute::TABLE,
        texture::BASE_TIER,
        texture::SCENE_TIER,
        group::TABLE,
    ]
}

const _: () = assert!(tiers_are_contiguous(&[&buffer::TABLE]));
const _: () = assert!(tiers_are_contiguous(&[&vertex_attribute::TABLE]));
