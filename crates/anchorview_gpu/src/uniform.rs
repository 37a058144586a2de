//! Uniform structures shared between the renderer and the shaders.
//!
//! Byte layouts are pinned by [`crate::layout`]. Constructors take every field
//! explicitly: a renderer with no active light passes [`LightingParams::UNLIT`]
//! rather than relying on zeroed memory, so the intent shows at the call site.
//! Nothing here normalizes, clamps or otherwise rewrites what it is given.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::layout::{self, GpuLayout, StructLayout};

/// A 3-vector stored in 16 bytes, as GPU uniform rules lay it out.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    _pad: f32,
}

impl Float3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, _pad: 0.0 }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Float3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Float3> for Vec3 {
    fn from(v: Float3) -> Self {
        v.to_vec3()
    }
}

/// Camera (eye) transforms for one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// View space to clip space, including the eye's intrinsics and viewport.
    pub projection: Mat4,
    /// World space to eye space.
    pub view: Mat4,
}

impl CameraParams {
    pub const fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view }
    }
}

/// Scene lighting for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    pub ambient_color: Vec3,
    /// Unit direction the light travels in, not a position.
    pub directional_direction: Vec3,
    pub directional_color: Vec3,
    /// Fallback shininess for materials without their own.
    pub material_shininess: f32,
}

impl LightingParams {
    /// No ambient or directional light.
    pub const UNLIT: Self = Self {
        ambient_color: Vec3::ZERO,
        directional_direction: Vec3::ZERO,
        directional_color: Vec3::ZERO,
        material_shininess: 0.0,
    };

    pub const fn new(
        ambient_color: Vec3,
        directional_direction: Vec3,
        directional_color: Vec3,
        material_shininess: f32,
    ) -> Self {
        Self {
            ambient_color,
            directional_direction,
            directional_color,
            material_shininess,
        }
    }
}

/// Per-frame, per-eye uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SharedUniforms {
    /// Column-major view-to-clip matrix.
    pub projection_matrix: [[f32; 4]; 4],
    /// Column-major world-to-eye matrix.
    pub view_matrix: [[f32; 4]; 4],
    pub ambient_light_color: Float3,
    pub directional_light_direction: Float3,
    pub directional_light_color: Float3,
    pub material_shininess: f32,
    _padding: [f32; 3],
}

impl SharedUniforms {
    pub fn new(camera: &CameraParams, lighting: &LightingParams) -> Self {
        let direction = lighting.directional_direction;
        if direction != Vec3::ZERO && !direction.is_normalized() {
            log::warn!(
                "Directional light direction {:?} is not unit length; storing it unchanged",
                direction
            );
        }

        Self {
            projection_matrix: camera.projection.to_cols_array_2d(),
            view_matrix: camera.view.to_cols_array_2d(),
            ambient_light_color: lighting.ambient_color.into(),
            directional_light_direction: direction.into(),
            directional_light_color: lighting.directional_color.into(),
            material_shininess: lighting.material_shininess,
            _padding: [0.0; 3],
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection_matrix)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_matrix)
    }

    pub fn camera(&self) -> CameraParams {
        CameraParams::new(self.projection(), self.view())
    }

    pub fn lighting(&self) -> LightingParams {
        LightingParams::new(
            self.ambient_light_color.to_vec3(),
            self.directional_light_direction.to_vec3(),
            self.directional_light_color.to_vec3(),
            self.material_shininess,
        )
    }
}

impl GpuLayout for SharedUniforms {
    const LAYOUT: StructLayout = layout::SHARED_UNIFORMS;
}

assert_gpu_layout!(
    SharedUniforms,
    [
        projection_matrix,
        view_matrix,
        ambient_light_color,
        directional_light_direction,
        directional_light_color,
        material_shininess,
    ]
);

/// Per-instance transform of a rendered anchor.
///
/// Instances are packed contiguously and read by instance index. Rebuild the
/// array every frame the anchor is visible; tracking may move it any frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct AnchorInstanceUniforms {
    /// Column-major anchor-local to world matrix.
    pub model_matrix: [[f32; 4]; 4],
}

impl AnchorInstanceUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model_matrix: model.to_cols_array_2d(),
        }
    }

    /// Packs one frame's instance array, in draw order.
    pub fn from_transforms(models: impl IntoIterator<Item = Mat4>) -> Vec<Self> {
        models.into_iter().map(Self::new).collect()
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model_matrix)
    }
}

impl GpuLayout for AnchorInstanceUniforms {
    const LAYOUT: StructLayout = layout::ANCHOR_INSTANCE_UNIFORMS;
}

assert_gpu_layout!(AnchorInstanceUniforms, [model_matrix]);

/// Per-material uniforms, shared by every instance using the material.
///
/// Ambient occlusion and per-map weights are reserved, not allocated; see
/// [`layout::MATERIAL_UNIFORMS`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// RGBA.
    pub base_color: [f32; 4],
    /// RGBA.
    pub irradiated_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    _padding: [f32; 2],
}

impl MaterialUniforms {
    pub fn new(base_color: Vec4, irradiated_color: Vec4, roughness: f32, metalness: f32) -> Self {
        Self {
            base_color: base_color.to_array(),
            irradiated_color: irradiated_color.to_array(),
            roughness,
            metalness,
            _padding: [0.0; 2],
        }
    }

    pub fn base_color(&self) -> Vec4 {
        Vec4::from_array(self.base_color)
    }

    pub fn irradiated_color(&self) -> Vec4 {
        Vec4::from_array(self.irradiated_color)
    }
}

impl GpuLayout for MaterialUniforms {
    const LAYOUT: StructLayout = layout::MATERIAL_UNIFORMS;
}

assert_gpu_layout!(
    MaterialUniforms,
    [base_color, irradiated_color, roughness, metalness]
);

/// Views a slice of uniform structs as the bytes to upload.
pub fn as_bytes<T: GpuLayout>(items: &[T]) -> &[u8] {
    bytemuck::cast_slice(items)
}
